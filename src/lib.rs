//! Snippet Engine
//!
//! Este crate es el adaptador de ejecución de código de un nodo de flujo:
//! recibe el texto de un snippet Python más un valor de entrada y devuelve
//! siempre un [`Envelope`] de éxito/fallo, nunca un error propagado.
//!
//! El intérprete embebido es un colaborador acotado: los valores cruzan la
//! frontera serializados como JSON y cada llamada corre en un scope nuevo.
//! No es un sandbox, no limita tiempo ni memoria del snippet.

use log::debug;
use pyo3::PyErr;
use serde_json::Value;
use thiserror::Error;

pub mod core;
pub use core::{Envelope, OUTPUT_LABEL};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Error inicializando el intérprete Python: {0}")]
    Init(PyErr),
}

pub struct SnippetEngine {
    _private: (),
}

impl SnippetEngine {
    pub fn init() -> Result<Self, EngineError> {
        core::init_python().map_err(EngineError::Init)?;
        Ok(Self { _private: () })
    }

    /// Ejecuta `code` con `inputs` ligado al parámetro `inputs` del snippet
    /// (por defecto `null`). Todo fallo de construcción o de ejecución viaja
    /// en la rama de error del [`Envelope`]; esta función no lanza.
    pub fn execute(&self, code: &str, inputs: Option<Value>) -> Envelope {
        let inputs = inputs.unwrap_or(Value::Null);
        debug!("execute: snippet de {} bytes", code.len());
        match core::exec_snippet(code, &inputs) {
            Ok(result) => Envelope::success(result),
            Err(e) => Envelope::failure(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_execute_never_raises() {
        let engine = SnippetEngine::init().expect("Fallo al inicializar Python");
        let env = engine.execute("esto no es python", None);
        assert!(env.error);
        assert_eq!(env.label_marked_for_outputs, OUTPUT_LABEL);
        assert!(env.result.is_none());
        assert!(!env.details.expect("details poblado").is_empty());
    }

    #[test]
    fn test_execute_literal() {
        let engine = SnippetEngine::init().expect("Fallo al inicializar Python");
        let env = engine.execute("return 42", None);
        assert_eq!(env, Envelope::success(json!(42)));
    }
}
