use crate::fields::Fields;
use crate::issue::Issue;
use serde::Serialize;

/// A field whose value must come from a fixed set of strings.
pub trait EnumField: Copy + PartialEq + 'static {
    const FIELD: &'static str;
    const VALUES: &'static [(&'static str, Self)];
    const DEFAULT: Option<Self>;

    fn parse(value: &str) -> Option<Self> {
        Self::VALUES
            .iter()
            .find(|(name, _)| *name == value)
            .map(|(_, variant)| *variant)
    }

    fn name(self) -> &'static str {
        Self::VALUES
            .iter()
            .find(|(_, variant)| *variant == self)
            .map_or("", |(name, _)| *name)
    }
}

/// Formats values as `'a', 'b', or 'c'`.
pub fn quoted_list<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    let values: Vec<&str> = values.into_iter().collect();
    let mut result = String::new();
    for (index, value) in values.iter().enumerate() {
        if index == 0 {
            result = format!("'{value}'");
        } else if index == values.len() - 1 {
            result = format!("{result}, or '{value}'");
        } else {
            result = format!("{result}, '{value}'");
        }
    }
    result
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum State {
    #[default]
    Ok,
    Emerging,
    Review,
    Revision,
    Legacy,
    Deprecated,
}

impl EnumField for State {
    const FIELD: &'static str = "state";
    const VALUES: &'static [(&'static str, Self)] = &[
        ("ok", State::Ok),
        ("emerging", State::Emerging),
        ("review", State::Review),
        ("revision", State::Revision),
        ("legacy", State::Legacy),
        ("deprecated", State::Deprecated),
    ];
    const DEFAULT: Option<Self> = Some(State::Ok);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DataFlow {
    Send,
    Receive,
    #[default]
    Bidirectional,
}

impl EnumField for DataFlow {
    const FIELD: &'static str = "dataFlow";
    const VALUES: &'static [(&'static str, Self)] = &[
        ("send", DataFlow::Send),
        ("receive", DataFlow::Receive),
        ("bidirectional", DataFlow::Bidirectional),
    ];
    const DEFAULT: Option<Self> = Some(DataFlow::Bidirectional);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Quadrant {
    LanguagesAndFrameworks,
    Platforms,
    Tools,
    Techniques,
}

impl EnumField for Quadrant {
    const FIELD: &'static str = "quadrant";
    const VALUES: &'static [(&'static str, Self)] = &[
        ("languagesAndFrameworks", Quadrant::LanguagesAndFrameworks),
        ("platforms", Quadrant::Platforms),
        ("tools", Quadrant::Tools),
        ("techniques", Quadrant::Techniques),
    ];
    const DEFAULT: Option<Self> = None;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Ring {
    Trial,
    Assess,
    Adopt,
    Hold,
}

impl EnumField for Ring {
    const FIELD: &'static str = "ring";
    const VALUES: &'static [(&'static str, Self)] = &[
        ("trial", Ring::Trial),
        ("assess", Ring::Assess),
        ("adopt", Ring::Adopt),
        ("hold", Ring::Hold),
    ];
    const DEFAULT: Option<Self> = Some(Ring::Adopt);
}

pub trait Describable {
    fn set_description(&mut self, description: String);
}

pub trait Evolvable {
    fn set_state(&mut self, state: State);
}

pub trait DataFlowing {
    fn set_data_flow(&mut self, data_flow: DataFlow);
}

pub fn read_description(fields: &Fields, target: &mut impl Describable, issues: &mut Vec<Issue>) {
    match fields.string("description") {
        Ok(Some(description)) => target.set_description(description),
        Ok(None) => {}
        Err(issue) => issues.push(issue),
    }
}

pub fn read_state(fields: &Fields, target: &mut impl Evolvable, issues: &mut Vec<Issue>) {
    match fields.enumeration::<State>() {
        Ok(state) => target.set_state(state),
        Err(issue) => issues.push(issue),
    }
}

pub fn read_data_flow(fields: &Fields, target: &mut impl DataFlowing, issues: &mut Vec<Issue>) {
    match fields.enumeration::<DataFlow>() {
        Ok(data_flow) => target.set_data_flow(data_flow),
        Err(issue) => issues.push(issue),
    }
}

/// The description and data flow every kind of link carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkDetails {
    pub description: String,
    pub data_flow: DataFlow,
}

impl Describable for LinkDetails {
    fn set_description(&mut self, description: String) {
        self.description = description;
    }
}

impl DataFlowing for LinkDetails {
    fn set_data_flow(&mut self, data_flow: DataFlow) {
        self.data_flow = data_flow;
    }
}

pub fn read_link_details(fields: &Fields, issues: &mut Vec<Issue>) -> LinkDetails {
    let mut details = LinkDetails::default();
    read_description(fields, &mut details, issues);
    read_data_flow(fields, &mut details, issues);
    details
}

/// The outcome of reading a group of mutually exclusive fields.
#[derive(Debug, PartialEq)]
pub enum Choice<T> {
    Missing,
    Conflict,
    /// Exactly one field was present but its value had the wrong type.
    Malformed,
    One(T),
}

/// Reads the fields in `options`, at most one of which may be present.
///
/// Each option pairs a field name with the constructor for its value.
/// Wrong-typed values are reported into `issues` and still count as present,
/// so a conflict is detected regardless of the value types.
pub fn exclusive_choice<T>(
    fields: &Fields,
    options: &[(&'static str, fn(String) -> T)],
    issues: &mut Vec<Issue>,
) -> Choice<T> {
    let mut present = 0;
    let mut chosen = None;
    for (field, make) in options {
        if fields.get(field).is_none() {
            continue;
        }
        present += 1;
        match fields.string(field) {
            Ok(Some(value)) => chosen = Some(make(value)),
            Ok(None) => {}
            Err(issue) => issues.push(issue),
        }
    }
    match (present, chosen) {
        (0, _) => Choice::Missing,
        (1, Some(value)) => Choice::One(value),
        (1, None) => Choice::Malformed,
        _ => Choice::Conflict,
    }
}
