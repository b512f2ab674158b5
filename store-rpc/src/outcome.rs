use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConvertError;
use crate::shape::Shape;

/// One store's entry in a [`Reply`](crate::Reply).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    #[serde(default)]
    pub store_id: String,
    #[serde(default)]
    pub store_name: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl Outcome {
    /// Label if set, otherwise the store name.
    pub fn display_name(&self) -> &str {
        match self.label.as_deref() {
            Some(label) if !label.is_empty() => label,
            _ => &self.store_name,
        }
    }

    pub fn data_shape(&self) -> Shape {
        Shape::of_value(&self.data)
    }

    /// Decode `data` into `destination`.
    ///
    /// A missing destination or missing data is a successful no-op. The
    /// destination is only written once decoding has fully succeeded, and it
    /// is replaced as a whole: record fields absent from `data` must be
    /// `#[serde(default)]`, otherwise the call fails with
    /// [`ConvertError::Conversion`]. Keys in `data` with no matching field
    /// are ignored.
    pub fn convert_to<T: DeserializeOwned>(
        &self,
        destination: Option<&mut T>,
    ) -> Result<(), ConvertError> {
        let Some(destination) = destination else {
            return Ok(());
        };
        if self.data.is_null() {
            return Ok(());
        }

        let data_shape = self.data_shape();
        let destination_shape = Shape::of_type::<T>();
        if destination_shape == Shape::Unit {
            return Err(ConvertError::InvalidDestination(format!(
                "`{}` cannot hold data",
                std::any::type_name::<T>()
            )));
        }
        if !data_shape.fits(destination_shape) {
            return Err(ConvertError::TypeMismatch {
                data: data_shape,
                destination: destination_shape,
            });
        }

        let encoded = serde_json::to_vec(&self.data).map_err(ConvertError::Conversion)?;
        *destination = serde_json::from_slice(&encoded).map_err(ConvertError::Conversion)?;
        Ok(())
    }

    /// Decode `data` into a fresh `T`, or `None` when there is no data.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<Option<T>, ConvertError> {
        if self.data.is_null() {
            return Ok(None);
        }
        let mut slot: Option<T> = None;
        self.convert_to(Some(&mut slot))?;
        Ok(slot)
    }
}
