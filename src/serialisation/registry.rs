//! Fixed schema-name registry.

use crate::serialisation::ep00::Ep00Serialiser;
use crate::serialisation::f142::F142Serialiser;
use crate::serialisation::tdct::TdctSerialiser;
use crate::serialisation::Serialiser;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};

/// Schema every source additionally reports its liveness under.
pub const CONNECTION_STATUS_SCHEMA: &str = "ep00";

type SerialiserFactory = fn(&str) -> Box<dyn Serialiser>;

lazy_static! {
    static ref SCHEMA_SERIALISERS: HashMap<&'static str, SerialiserFactory> = {
        let mut serialisers: HashMap<&'static str, SerialiserFactory> = HashMap::new();
        serialisers.insert("f142", |source_name| {
            Box::new(F142Serialiser::new(source_name))
        });
        serialisers.insert("tdct", |source_name| {
            Box::new(TdctSerialiser::new(source_name))
        });
        serialisers.insert(CONNECTION_STATUS_SCHEMA, |source_name| {
            Box::new(Ep00Serialiser::new(source_name))
        });
        serialisers
    };
}

/// The requested schema name is not in the registry.
pub struct UnsupportedSchema {
    schema: String,
    supported: Vec<&'static str>,
}

impl UnsupportedSchema {
    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn supported(&self) -> &[&'static str] {
        &self.supported
    }
}

impl Debug for UnsupportedSchema {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "UnsupportedSchema({})", self.schema)
    }
}

impl Display for UnsupportedSchema {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} is not a recognised supported schema, use one of {:?}",
            self.schema,
            self.supported
        )
    }
}

impl Error for UnsupportedSchema {}

/// All schema names the registry can resolve, sorted for stable reporting.
pub fn supported_schemas() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = SCHEMA_SERIALISERS.keys().copied().collect();
    names.sort_unstable();
    names
}

/// Construct the serialiser registered under `schema`, bound to one source.
pub(crate) fn serialiser_for(
    schema: &str,
    source_name: &str,
) -> Result<Box<dyn Serialiser>, UnsupportedSchema> {
    match SCHEMA_SERIALISERS.get(schema) {
        Some(factory) => Ok(factory(source_name)),
        None => Err(UnsupportedSchema {
            schema: schema.to_string(),
            supported: supported_schemas(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{serialiser_for, supported_schemas, CONNECTION_STATUS_SCHEMA};

    #[test]
    fn registry_resolves_every_supported_schema() {
        for schema in supported_schemas() {
            let serialiser = serialiser_for(schema, "some_pv").expect("registered schema");
            assert_eq!(serialiser.schema(), schema);
        }
    }

    #[test]
    fn registry_includes_connection_status_schema() {
        assert!(supported_schemas().contains(&CONNECTION_STATUS_SCHEMA));
    }

    #[test]
    fn unknown_schema_reports_valid_names() {
        let err = serialiser_for("nonsense", "some_pv").expect_err("unknown schema");
        assert_eq!(err.schema(), "nonsense");
        let rendered = err.to_string();
        assert!(rendered.contains("not a recognised supported schema"));
        for schema in supported_schemas() {
            assert!(rendered.contains(schema));
        }
    }
}
