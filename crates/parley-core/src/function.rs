//! Function definitions, calls and results.
//!
//! A [`FunctionDefinition`] pairs the schema the language model sees with an
//! [`Invocable`] implementation. Implementations are trait objects so that a
//! registry can hold arbitrary callables behind one interface.

use async_trait::async_trait;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::error::BoxError;
use crate::validation::{IdentifierRules, ValidationError};

/// Keyword arguments passed to a function implementation.
pub type Arguments = serde_json::Map<String, Value>;

/// A callable function implementation.
#[async_trait]
pub trait Invocable: Send + Sync {
    /// Invoke the implementation with keyword-style arguments.
    async fn call(&self, arguments: Arguments) -> Result<Value, BoxError>;
}

/// Adapter turning an async closure into an [`Invocable`].
pub struct FnInvocable<F> {
    func: F,
}

#[async_trait]
impl<F, Fut> Invocable for FnInvocable<F>
where
    F: Fn(Arguments) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, BoxError>> + Send + 'static,
{
    async fn call(&self, arguments: Arguments) -> Result<Value, BoxError> {
        (self.func)(arguments).await
    }
}

/// Wrap an async closure as a shareable [`Invocable`].
///
/// ```rust
/// use parley_core::BoxError;
/// use parley_core::function::invocable_fn;
/// use serde_json::Value;
///
/// let echo = invocable_fn(|args| async move { Ok::<_, BoxError>(Value::Object(args)) });
/// # let _ = echo;
/// ```
pub fn invocable_fn<F, Fut>(func: F) -> Arc<dyn Invocable>
where
    F: Fn(Arguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, BoxError>> + Send + 'static,
{
    Arc::new(FnInvocable { func })
}

/// Declared parameter of a function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionParameter {
    /// JSON type name (`"number"`, `"string"`, ...)
    #[serde(rename = "type")]
    pub param_type: String,
    pub description: String,
    /// Allowed values, when the parameter restricts its domain
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<String>>,
}

impl FunctionParameter {
    pub fn new(param_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            param_type: param_type.into(),
            description: description.into(),
            allowed_values: None,
        }
    }

    /// Restrict the parameter to an enumerated set of values.
    pub fn with_allowed_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

/// A named function an assistant can call.
#[derive(Clone, Serialize)]
pub struct FunctionDefinition {
    name: String,
    description: String,
    parameters: BTreeMap<String, FunctionParameter>,
    #[serde(skip)]
    implementation: Arc<dyn Invocable>,
}

impl FunctionDefinition {
    /// Create a definition, validating the function name.
    ///
    /// Names are 1-64 characters of ASCII letters, digits, `_` and `-`.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        implementation: Arc<dyn Invocable>,
    ) -> Result<Self, ValidationError> {
        let name = IdentifierRules::FUNCTION_NAME.validate(&name.into())?;
        Ok(Self {
            name,
            description: description.into(),
            parameters: BTreeMap::new(),
            implementation,
        })
    }

    /// Declare a parameter.
    pub fn with_parameter(mut self, name: impl Into<String>, parameter: FunctionParameter) -> Self {
        self.parameters.insert(name.into(), parameter);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn parameters(&self) -> &BTreeMap<String, FunctionParameter> {
        &self.parameters
    }

    /// Run the implementation.
    pub async fn invoke(&self, arguments: Arguments) -> Result<Value, BoxError> {
        self.implementation.call(arguments).await
    }
}

impl fmt::Debug for FunctionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// A request to call a function by name. Value object with no identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Arguments,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Build a call from a JSON object literal; non-objects yield no arguments.
    pub fn from_json(name: impl Into<String>, arguments: Value) -> Self {
        let arguments = match arguments {
            Value::Object(map) => map,
            _ => Arguments::new(),
        };
        Self::new(name, arguments)
    }
}

/// The return value of one successful call.
///
/// Serializes as a single-entry mapping from function name to value.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionResult {
    pub name: String,
    pub result: Value,
}

impl FunctionResult {
    pub fn new(name: impl Into<String>, result: Value) -> Self {
        Self {
            name: name.into(),
            result,
        }
    }
}

impl Serialize for FunctionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.name, &self.result)?;
        map.end()
    }
}
