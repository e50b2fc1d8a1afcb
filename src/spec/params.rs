use super::document::Specification;
use super::path::NodePath;
use crate::error::{ClientError, Result};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Where a parameter travels in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParameterLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParameterLocation {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ParameterLocation::Path => "path",
            ParameterLocation::Query => "query",
            ParameterLocation::Header => "header",
            ParameterLocation::Cookie => "cookie",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParameterLocation {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "path" => Ok(ParameterLocation::Path),
            "query" => Ok(ParameterLocation::Query),
            "header" => Ok(ParameterLocation::Header),
            "cookie" => Ok(ParameterLocation::Cookie),
            _ => Err(()),
        }
    }
}

/// Runtime parameters partitioned by declared location.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedParameters(BTreeMap<ParameterLocation, Map<String, Value>>);

impl GroupedParameters {
    /// Parameters for one location; `None` when nothing was assigned there.
    #[must_use]
    pub fn get(&self, location: ParameterLocation) -> Option<&Map<String, Value>> {
        self.0.get(&location)
    }

    #[must_use]
    pub fn contains(&self, location: ParameterLocation) -> bool {
        self.0.contains_key(&location)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParameterLocation, &Map<String, Value>)> {
        self.0.iter().map(|(location, params)| (*location, params))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every parameter in the query; used when no operation declares locations.
    pub(crate) fn query_only(params: &Map<String, Value>) -> Self {
        let mut grouped = Self::default();
        for (name, value) in params {
            grouped.insert(ParameterLocation::Query, name.clone(), value.clone());
        }
        grouped
    }

    fn insert(&mut self, location: ParameterLocation, name: String, value: Value) {
        self.0.entry(location).or_default().insert(name, value);
    }
}

/// Group runtime parameters by the locations declared for the operation.
///
/// Declarations are read from the path item first and from the operation second, so an
/// operation-level parameter replaces a path-level one with the same name. Each declaration is
/// resolved through `$ref` before its `name` and `in` are read. Names without a declaration go
/// to the query.
///
/// # Arguments
///
/// * `spec` - The specification
/// * `operation_node` - Node path of the operation (`paths > /books/{id} > get`)
/// * `params` - Flat name → value mapping
///
/// # Errors
///
/// [`ClientError::Parameter`] when `params` is null or not a mapping.
pub fn group_parameters(
    spec: &Specification,
    operation_node: &NodePath,
    params: &Value,
) -> Result<GroupedParameters> {
    let params = match params {
        Value::Object(map) => map,
        Value::Null => {
            return Err(ClientError::Parameter(
                "parameters must be a mapping, got null".to_string(),
            ))
        }
        other => {
            return Err(ClientError::Parameter(format!(
                "parameters must be a mapping, got {other}"
            )))
        }
    };

    let declared = declared_locations(spec, operation_node)?;
    let mut grouped = GroupedParameters::default();
    for (name, value) in params {
        let location = declared
            .get(name)
            .copied()
            .unwrap_or(ParameterLocation::Query);
        grouped.insert(location, name.clone(), value.clone());
    }
    Ok(grouped)
}

/// Declared parameter name → location for an operation, path-level first.
fn declared_locations(
    spec: &Specification,
    operation_node: &NodePath,
) -> Result<HashMap<String, ParameterLocation>> {
    let mut declared = HashMap::new();
    let levels = operation_node
        .parent()
        .into_iter()
        .chain(std::iter::once(operation_node.clone()));

    for level in levels {
        let list = level.child("parameters");
        let count = spec
            .resolve(&list)?
            .and_then(|node| node.value().as_array().map(Vec::len))
            .unwrap_or(0);
        for index in 0..count {
            let Some(parameter) = spec.resolve(&list.child(index.to_string()))? else {
                continue;
            };
            let parameter = parameter.value();
            let Some(name) = parameter.get("name").and_then(Value::as_str) else {
                continue;
            };
            let location = parameter
                .get("in")
                .and_then(Value::as_str)
                .and_then(|location| location.parse().ok())
                .unwrap_or(ParameterLocation::Query);
            declared.insert(name.to_string(), location);
        }
    }
    Ok(declared)
}
