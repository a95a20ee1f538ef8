use opcua::server::prelude::*;
use opcua::sync::RwLock;
use std::sync::Arc;

use crate::config::{AddressSpaceSettings, ValueStrategy};
use crate::error::InitError;
use crate::simulator::{TemperatureGenerator, TemperatureRange};

/// Nodes created (or found) by [`initialize`].
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureNodes {
    pub namespace: u16,
    pub folder_id: NodeId,
    pub temperature_id: NodeId,
}

impl TemperatureNodes {
    /// Node id string clients use to address the temperature variable.
    pub fn item_descriptor(&self) -> String {
        self.temperature_id.to_string()
    }
}

/// Find a child organized by `parent` whose browse name is `browse_name`.
pub fn find_child(address_space: &AddressSpace, parent: &NodeId, browse_name: &str) -> Option<NodeId> {
    let wanted = QualifiedName::from(browse_name);
    address_space
        .find_references(parent, Some((ReferenceTypeId::Organizes, false)))?
        .into_iter()
        .map(|reference| reference.target_node)
        .find(|target| {
            address_space
                .find_node(target)
                .map(|node| node.as_node().browse_name() == wanted)
                .unwrap_or(false)
        })
}

/// Populate `Objects/<folder>/<variable>` in the address space.
///
/// Existing nodes with the configured browse names are reused, so running
/// this twice against the same address space leaves a single folder and a
/// single variable.
pub fn initialize(
    address_space: &mut AddressSpace,
    settings: &AddressSpaceSettings,
    strategy: ValueStrategy,
    range: TemperatureRange,
) -> Result<TemperatureNodes, InitError> {
    // Register namespace for the simulator nodes
    let namespace = address_space
        .register_namespace(&settings.namespace_uri)
        .map_err(|_| InitError::Namespace(settings.namespace_uri.clone()))?;

    let objects_id = NodeId::objects_folder_id();
    if address_space.find_node(&objects_id).is_none() {
        return Err(InitError::MissingObjectsFolder);
    }

    // Find or create the Simulations folder under Objects
    let folder_id = match find_child(address_space, &objects_id, &settings.folder_name) {
        Some(existing) => {
            tracing::info!("{} folder already present as {}", settings.folder_name, existing);
            existing
        }
        None => {
            tracing::info!("{} folder not found, creating", settings.folder_name);
            let folder_id = NodeId::new(namespace, settings.folder_name.clone());
            let created = address_space.add_folder_with_id(
                &folder_id,
                settings.folder_name.as_str(),
                settings.folder_name.as_str(),
                &objects_id,
            );
            if !created {
                return Err(InitError::FolderCreation(settings.folder_name.clone()));
            }
            folder_id
        }
    };

    // Reuse an existing Temperature variable
    if let Some(existing) = find_child(address_space, &folder_id, &settings.variable_name) {
        tracing::info!("{} variable already present as {}", settings.variable_name, existing);
        return Ok(TemperatureNodes {
            namespace,
            folder_id,
            temperature_id: existing,
        });
    }

    let temperature_key = format!("{}.{}", settings.folder_name, settings.variable_name);
    let temperature_id = NodeId::new(namespace, temperature_key);
    let initial = TemperatureGenerator::new(range).generate_variant();
    tracing::info!("Temperature value: {:?}", initial);

    // Create Int32 temperature variable
    let mut builder = VariableBuilder::new(
        &temperature_id,
        settings.variable_name.as_str(),
        settings.variable_name.as_str(),
    )
    .data_type(DataTypeId::Int32)
    .value(initial)
    .organized_by(&folder_id);

    // Live sensor: draw a new value on every read
    if strategy == ValueStrategy::OnRead {
        let mut generator = TemperatureGenerator::new(range);
        builder = builder.value_getter(AttrFnGetter::new_boxed(
            move |_, _, _, _, _, _| -> Result<Option<DataValue>, StatusCode> {
                Ok(Some(DataValue::new_now(generator.generate_variant())))
            },
        ));
    }

    if !builder.insert(address_space) {
        return Err(InitError::VariableCreation(settings.variable_name.clone()));
    }

    tracing::info!(
        "Created {} variable {} ({:?})",
        settings.variable_name,
        temperature_id,
        strategy
    );

    Ok(TemperatureNodes {
        namespace,
        folder_id,
        temperature_id,
    })
}

pub fn write_temperature(address_space: &mut AddressSpace, node_id: &NodeId, value: Variant) -> bool {
    let now = DateTime::now();
    address_space.set_variable_value(node_id.clone(), value, &now, &now)
}

/// Read the current value of an `Int32` variable, invoking its getter if it has one.
pub fn read_temperature(address_space: &AddressSpace, node_id: &NodeId) -> Option<i32> {
    match address_space.find_node(node_id)? {
        NodeType::Variable(variable) => {
            let data_value = variable.value(
                TimestampsToReturn::Neither,
                NumericRange::None,
                &QualifiedName::null(),
                0.0,
            );
            match data_value.value {
                Some(Variant::Int32(value)) => Some(value),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Periodically write a freshly generated temperature into `node_id`.
pub async fn refresh_loop(
    address_space: Arc<RwLock<AddressSpace>>,
    node_id: NodeId,
    mut generator: TemperatureGenerator,
    interval_ms: u64,
) {
    let mut interval = tokio::time::interval(tokio::time::Duration::from_millis(interval_ms));

    tracing::info!("Temperature refresh loop started ({} ms)", interval_ms);

    loop {
        interval.tick().await;

        let value = generator.generate_variant();
        if !write_temperature(&mut address_space.write(), &node_id, value) {
            tracing::error!("Failed to write temperature to {}", node_id);
        }
    }
}
