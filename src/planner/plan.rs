//! Plan abstraction shared by every statement kind

use std::fmt;
use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};

use super::delete::DeletePlan;
use super::error::{PlannerError, PlannerResult};

/// One physical statement bound for one backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Partition {
    /// Rewritten SQL text
    pub query: String,
    /// Target backend
    pub backend: String,
    /// Slot range label, empty for single and global tables
    pub range: String,
}

/// Statement kind of a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanType {
    Delete,
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanType::Delete => write!(f, "DELETE"),
        }
    }
}

/// Lifecycle of a plan. `Built` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanState {
    Constructed,
    Building,
    Built,
    Failed(PlannerError),
}

/// Serialized shape of a plan, field order and casing fixed
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct PlanDocument<'p> {
    raw_query: &'p str,
    partitions: &'p [Partition],
}

/// Tab-indented pretty printer that also escapes `<`, `>`, `&`, U+2028 and
/// U+2029, so plans match the JSON logged by other proxy components
struct PlanFormatter {
    pretty: PrettyFormatter<'static>,
}

impl PlanFormatter {
    fn new() -> Self {
        Self {
            pretty: PrettyFormatter::with_indent(b"\t"),
        }
    }
}

impl Formatter for PlanFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            let escaped: &[u8] = match c {
                '<' => b"\\u003c",
                '>' => b"\\u003e",
                '&' => b"\\u0026",
                '\u{2028}' => b"\\u2028",
                '\u{2029}' => b"\\u2029",
                _ => continue,
            };
            writer.write_all(&fragment.as_bytes()[start..i])?;
            writer.write_all(escaped)?;
            start = i + c.len_utf8();
        }
        writer.write_all(&fragment.as_bytes()[start..])
    }

    fn begin_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.begin_array(writer)
    }

    fn end_array<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.begin_object(writer)
    }

    fn end_object<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        self.pretty.end_object_value(writer)
    }
}

/// Render a plan as tab-indented JSON
pub(crate) fn plan_json(raw_query: &str, partitions: &[Partition]) -> PlannerResult<String> {
    let document = PlanDocument {
        raw_query,
        partitions,
    };
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, PlanFormatter::new());
    document.serialize(&mut serializer)?;
    String::from_utf8(buf).map_err(|e| PlannerError::Serialization(e.to_string()))
}

/// A statement plan. The set of statement kinds is closed.
#[derive(Debug)]
pub enum Plan<'a> {
    Delete(DeletePlan<'a>),
}

impl<'a> Plan<'a> {
    /// Validate the statement and resolve its partitions
    pub fn build(&mut self) -> PlannerResult<()> {
        match self {
            Plan::Delete(plan) => plan.build(),
        }
    }

    pub fn plan_type(&self) -> PlanType {
        match self {
            Plan::Delete(plan) => plan.plan_type(),
        }
    }

    pub fn raw_query(&self) -> &str {
        match self {
            Plan::Delete(plan) => plan.raw_query(),
        }
    }

    pub fn database(&self) -> &str {
        match self {
            Plan::Delete(plan) => plan.database(),
        }
    }

    /// Built partitions; empty unless the plan is built
    pub fn partitions(&self) -> &[Partition] {
        match self {
            Plan::Delete(plan) => plan.partitions(),
        }
    }

    pub fn state(&self) -> &PlanState {
        match self {
            Plan::Delete(plan) => plan.state(),
        }
    }

    pub fn is_built(&self) -> bool {
        matches!(self.state(), PlanState::Built)
    }

    /// `{"RawQuery", "Partitions"}` document
    pub fn to_json(&self) -> PlannerResult<String> {
        match self {
            Plan::Delete(plan) => plan.to_json(),
        }
    }
}

impl<'a> From<DeletePlan<'a>> for Plan<'a> {
    fn from(plan: DeletePlan<'a>) -> Self {
        Plan::Delete(plan)
    }
}
