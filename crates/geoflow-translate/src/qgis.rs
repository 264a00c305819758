//! QGIS processing models.
//!
//! Algorithm and user input names must be unique within a model, so both
//! carry the id of the operation they came from as a `_<id>` suffix. The
//! reverse mapping strips it again.

use std::collections::{BTreeMap, HashMap, HashSet};

use geoflow_types::{Connection, Operation, OperationId, Port, PortType, Resource, Workflow};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::catalog::{Catalog, QGIS_TOOL};
use crate::error::{Result, TranslateError};
use crate::matching;

/// Parameter that collects raster inputs.
pub const GRIDS: &str = "GRIDS";
/// Parameter holding the primary vector input.
pub const INPUT: &str = "INPUT";
/// The single declared output of every algorithm.
pub const OUTPUT: &str = "OUTPUT";
/// Key of a parameter value that names a model-level input.
const USER_INPUT: &str = "user_input";

/// A processing model document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QgisModel {
    pub name: String,
    pub group: String,
    pub algorithms: BTreeMap<String, QgisAlgorithm>,
    pub inputs: BTreeMap<String, ModelInput>,
}

/// One algorithm of a model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QgisAlgorithm {
    pub id: String,
    pub console_name: String,
    pub description: String,
    pub position: [f64; 2],
    pub params: Map<String, Value>,
    pub outputs: BTreeMap<String, ModelOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<AlgorithmSource>,
}

/// A declared algorithm output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelOutput {
    #[serde(rename = "type")]
    pub output_type: String,
}

/// A model-level input the user supplies when running the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelInput {
    pub name: String,
    /// `vector`, `raster` or `string`.
    pub kind: String,
    pub description: String,
}

/// Where a translated algorithm originally executed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlgorithmSource {
    pub resource: Resource,
    pub label: String,
    pub url: String,
}

/// Strip a trailing `_<digits>` suffix.
pub fn strip_suffix(name: &str) -> &str {
    match numeric_suffix(name) {
        Some((head, _)) => head,
        None => name,
    }
}

fn numeric_suffix(name: &str) -> Option<(&str, &str)> {
    let (head, tail) = name.rsplit_once('_')?;
    (!tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit())).then_some((head, tail))
}

fn kind_of(port_type: &PortType) -> &'static str {
    match port_type {
        PortType::Geom => "vector",
        PortType::Coverage => "raster",
        _ => "string",
    }
}

fn port_type_of(kind: &str) -> PortType {
    match kind {
        "vector" => PortType::Geom,
        "raster" => PortType::Coverage,
        _ => PortType::Text,
    }
}

/// Unique algorithm name of an operation.
fn algorithm_name(op: &Operation) -> String {
    let base = if op.metadata.longname.is_empty() {
        &op.metadata.label
    } else {
        &op.metadata.longname
    };
    format!("{base}_{}", op.id)
}

// ─────────────────────────────────────────────────────────────────────────────
// Native → QGIS
// ─────────────────────────────────────────────────────────────────────────────

/// Convert a native workflow into a processing model.
pub fn to_qgis(workflow: &Workflow, catalog: &Catalog) -> Result<QgisModel> {
    workflow.validate()?;
    let tool = catalog.tool(QGIS_TOOL)?;

    let mut model = QgisModel {
        name: if workflow.metadata.longname.is_empty() {
            workflow.id.clone()
        } else {
            workflow.metadata.longname.clone()
        },
        group: "geoflow".to_string(),
        ..Default::default()
    };

    for op in &workflow.operations {
        let entry = matching::best_match(tool, op)?;
        let name = algorithm_name(op);

        let mut params = Map::new();
        let mut grids = Vec::new();
        for (index, port) in op.inputs.iter().enumerate() {
            let producer = workflow
                .incoming(&op.id)
                .find(|c| c.to_parameter == index)
                .map(|c| {
                    workflow
                        .operation(&c.from_operation)
                        .map(algorithm_name)
                        .ok_or_else(|| {
                            TranslateError::MalformedDocument(format!(
                                "connection from unknown operation {}",
                                c.from_operation
                            ))
                        })
                })
                .transpose()?;
            let connected = producer.is_some();

            let value = match producer {
                Some(producer) => Value::String(producer),
                None if port.port_type.is_spatial() => {
                    let input_name = format!("{}_{}", port.identifier, op.id);
                    model.inputs.insert(
                        input_name.clone(),
                        ModelInput {
                            name: input_name.clone(),
                            kind: kind_of(&port.port_type).to_string(),
                            description: port.description.clone(),
                        },
                    );
                    Value::Object(Map::from_iter([(
                        USER_INPUT.to_string(),
                        Value::String(input_name),
                    )]))
                }
                None => match &port.value {
                    Value::Null => Value::String(String::new()),
                    literal => literal.clone(),
                },
            };

            match port.port_type {
                PortType::Coverage => grids.push(value),
                _ => {
                    let key = if port.port_type == PortType::Geom && !params.contains_key(INPUT) {
                        INPUT.to_string()
                    } else {
                        port.identifier.clone()
                    };
                    let value = if connected { Value::Array(vec![value]) } else { value };
                    params.insert(key, value);
                }
            }
        }
        if !grids.is_empty() {
            params.insert(GRIDS.to_string(), Value::Array(grids));
        }

        let output_type = if op.outputs.iter().any(|p| p.port_type == PortType::Geom) {
            "vector"
        } else if op.outputs.iter().any(|p| p.port_type == PortType::Coverage) {
            "raster"
        } else {
            "string"
        };

        debug!(operation = %op.id, algorithm = %name, "translated operation");
        model.algorithms.insert(
            name.clone(),
            QgisAlgorithm {
                id: name.clone(),
                console_name: entry.console_name.clone(),
                description: name,
                position: op.metadata.position,
                params,
                outputs: BTreeMap::from([(
                    OUTPUT.to_string(),
                    ModelOutput {
                        output_type: output_type.to_string(),
                    },
                )]),
                source: Some(AlgorithmSource {
                    resource: op.metadata.resource.clone(),
                    label: op.metadata.label.clone(),
                    url: op.metadata.url.clone(),
                }),
            },
        );
    }

    Ok(model)
}

// ─────────────────────────────────────────────────────────────────────────────
// QGIS → native
// ─────────────────────────────────────────────────────────────────────────────

/// An input port before reordering, with the algorithm feeding it if any.
struct PendingPort {
    port: Port,
    producer: Option<String>,
}

impl PendingPort {
    fn rank(&self) -> u8 {
        if self.producer.is_some() {
            0
        } else if self.port.port_type.is_spatial() {
            1
        } else {
            2
        }
    }
}

/// Convert a processing model into a native workflow.
pub fn from_qgis(model: &QgisModel, catalog: &Catalog) -> Result<Workflow> {
    let tool = catalog.tool(QGIS_TOOL)?;

    let ids = assign_ids(model);

    let mut output_types: HashMap<&str, PortType> = HashMap::new();
    for (name, algorithm) in &model.algorithms {
        let entry = tool.entry(&algorithm.console_name)?;
        output_types.insert(name.as_str(), entry.output_port_type());
    }

    let mut workflow = Workflow::new(model.name.clone(), model.name.clone());

    for (name, algorithm) in &model.algorithms {
        let id = ids.get(name.as_str()).cloned().unwrap_or_default();
        let mut pending = Vec::new();

        for (key, value) in &algorithm.params {
            match value {
                Value::Array(items) => {
                    for item in items {
                        pending.push(parameter_port(model, &output_types, key, item, true)?);
                    }
                }
                other if key == GRIDS => {
                    pending.push(parameter_port(model, &output_types, key, other, true)?);
                }
                other => pending.push(parameter_port(model, &output_types, key, other, false)?),
            }
        }

        pending.sort_by_key(PendingPort::rank);

        let mut inputs = Vec::with_capacity(pending.len());
        for (index, PendingPort { mut port, producer }) in pending.into_iter().enumerate() {
            port.id = index;
            if let Some(producer) = producer {
                let from = ids.get(producer.as_str()).ok_or_else(|| {
                    TranslateError::MalformedDocument(format!(
                        "algorithm {name} reads from unknown algorithm {producer}"
                    ))
                })?;
                workflow
                    .connections
                    .push(Connection::new(from.clone(), 0, id.clone(), index));
            }
            inputs.push(port);
        }

        let output_type = output_types.get(name.as_str()).cloned().unwrap_or_default();
        let mut op = Operation::new(id, Resource::Other("QGIS".to_string()));
        op.metadata.longname = strip_suffix(&algorithm.description).to_string();
        op.metadata.description = op.metadata.longname.clone();
        op.metadata.position = algorithm.position;
        op.metadata.label = algorithm.console_name.clone();
        if let Some(source) = &algorithm.source {
            op.metadata.resource = source.resource.clone();
            op.metadata.label = source.label.clone();
            op.metadata.url = source.url.clone();
        }
        op.inputs = inputs;
        op.outputs = vec![Port::new(0, OUTPUT, output_type)];
        op.update_counts();
        workflow.operations.push(op);
    }

    workflow.operations.sort_by(|a, b| {
        numeric_order(&a.id)
            .cmp(&numeric_order(&b.id))
            .then_with(|| a.id.cmp(&b.id))
    });
    workflow.validate()?;
    workflow.sync_references()?;
    Ok(workflow)
}

/// Operation id for every algorithm.
///
/// A `_<digits>` suffix becomes the id unless an earlier algorithm already
/// claimed it. Algorithms without a free suffix take their 1-based position
/// when that is unused, otherwise the lowest unused number.
fn assign_ids(model: &QgisModel) -> HashMap<&str, OperationId> {
    let mut ids = HashMap::new();
    let mut taken: HashSet<OperationId> = HashSet::new();
    let mut unassigned = Vec::new();

    for (index, name) in model.algorithms.keys().enumerate() {
        match numeric_suffix(name) {
            Some((_, digits)) if taken.insert(digits.to_string()) => {
                ids.insert(name.as_str(), digits.to_string());
            }
            _ => unassigned.push((index, name.as_str())),
        }
    }

    let mut lowest = 1usize;
    for (index, name) in unassigned {
        let mut id = (index + 1).to_string();
        if taken.contains(&id) {
            while taken.contains(&lowest.to_string()) {
                lowest += 1;
            }
            id = lowest.to_string();
        }
        if numeric_suffix(name).is_some() {
            debug!(algorithm = name, id = %id, "renumbered clashing algorithm");
        }
        taken.insert(id.clone());
        ids.insert(name, id);
    }
    ids
}

fn numeric_order(id: &str) -> Option<u64> {
    id.parse().ok()
}

/// Build the port one parameter value stands for.
///
/// Strings inside a list name producing algorithms; a `user_input` object
/// names a model input; anything else is a literal.
fn parameter_port(
    model: &QgisModel,
    output_types: &HashMap<&str, PortType>,
    key: &str,
    value: &Value,
    in_list: bool,
) -> Result<PendingPort> {
    let keyed_type = match key {
        GRIDS => Some(PortType::Coverage),
        INPUT => Some(PortType::Geom),
        _ => None,
    };

    if let Some(input_name) = value.get(USER_INPUT).and_then(Value::as_str) {
        let input = model.inputs.get(input_name).ok_or_else(|| {
            TranslateError::MalformedDocument(format!("unknown model input {input_name}"))
        })?;
        let port_type = keyed_type.unwrap_or_else(|| port_type_of(&input.kind));
        let identifier = strip_suffix(input_name);
        let mut port = Port::new(0, identifier, port_type);
        port.name = identifier.to_string();
        port.description = input.description.clone();
        return Ok(PendingPort {
            port,
            producer: None,
        });
    }

    let identifier = strip_suffix(key);
    if in_list {
        if let Some(producer) = value.as_str() {
            let port_type = keyed_type
                .or_else(|| output_types.get(producer).cloned())
                .unwrap_or_default();
            let mut port = Port::new(0, identifier, port_type);
            port.name = identifier.to_string();
            return Ok(PendingPort {
                port,
                producer: Some(producer.to_string()),
            });
        }
    }

    let mut port = Port::new(0, identifier, PortType::Text).with_value(value.clone());
    port.name = identifier.to_string();
    Ok(PendingPort {
        port,
        producer: None,
    })
}
