use derive_more::Deref;
use eyre::Result;
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    future::Future,
    pin::Pin,
    time::Duration,
};

/// Trait implemented by every metric source.
pub trait Collector: Send {
    /// Stable name of this source, e.g. `"system"`.
    fn name(&self) -> &str;

    /// Period between two samples.
    fn interval(&self) -> Duration;

    /// Take one sample. Either the whole sample or an error, never partial data.
    fn sample(&mut self) -> Pin<Box<dyn Future<Output = Result<Sample>> + Send + '_>>;
}

/// One successful reading of a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Deref)]
#[serde(transparent)]
pub struct Sample(serde_json::Value);

impl Sample {
    pub fn new<T: Serialize>(data: &T) -> Result<Self> {
        Ok(Self(serde_json::to_value(data)?))
    }

    pub fn into_inner(self) -> serde_json::Value {
        self.0
    }
}

impl From<serde_json::Value> for Sample {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}
