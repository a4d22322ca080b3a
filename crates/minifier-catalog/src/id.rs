use crate::error::{CatalogError, Result};
use minifier_core::RecordId;
use minifier_snowflake::{Clock, Snowflake};

/// Hands out process-unique [`RecordId`]s.
pub trait IdSource: Send + Sync {
    fn next_id(&self) -> Result<RecordId>;
}

impl<C: Clock> IdSource for Snowflake<C> {
    fn next_id(&self) -> Result<RecordId> {
        let id = Snowflake::next_id(self).map_err(|e| CatalogError::IdGeneration(e.to_string()))?;
        Ok(RecordId::from_raw(id.as_u64()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minifier_snowflake::SnowflakeSettings;

    #[test]
    fn snowflake_ids_are_prefixed_and_unique() {
        let source = Snowflake::new(SnowflakeSettings::builder().node_id(1).build()).unwrap();

        let a = IdSource::next_id(&source).unwrap();
        let b = IdSource::next_id(&source).unwrap();

        assert!(a.as_str().starts_with("url_"));
        assert_ne!(a, b);
    }
}
