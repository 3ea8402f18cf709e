use dotenvy::dotenv;
use log::debug;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::ffi::CString;

/// Etiqueta constante bajo la que el host consume la salida de cada nodo.
pub const OUTPUT_LABEL: &str = "rawResult";

/// Registro de éxito/fallo que devuelve cada llamada a `execute`.
///
/// Exactamente uno de `result`/`details` va poblado, seleccionado por
/// `error`; la rama no usada se omite del JSON serializado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub error: bool,
    pub label_marked_for_outputs: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Envelope {
    pub fn success(result: Value) -> Self {
        Envelope { error: false,
                   label_marked_for_outputs: OUTPUT_LABEL.to_string(),
                   result: Some(result),
                   details: None }
    }

    pub fn failure(details: String) -> Self {
        Envelope { error: true,
                   label_marked_for_outputs: OUTPUT_LABEL.to_string(),
                   result: None,
                   details: Some(details) }
    }
}

/// Inicializa el intérprete embebido usando el archivo .env
/// (`PYTHON_PATH` es opcional; sin él decide pyo3/auto-initialize).
/// Ojo: pyo3 lee `PYTHON_SYS_EXECUTABLE` al compilar; el override en
/// runtime sólo aplica si la variable llega al entorno de build.
pub fn init_python() -> PyResult<()> {
    dotenv().ok();
    if let Ok(python_path) = env::var("PYTHON_PATH") {
        env::set_var("PYTHON_SYS_EXECUTABLE", python_path);
    }
    Python::attach(|py| {
        debug!("init: python {}", py.version());
        Ok(())
    })
}

/// Envuelve el snippet como cuerpo de una función de un parámetro.
///
/// Cada línea se reindenta cuatro espacios para que los bloques del
/// snippet sigan siendo válidos un nivel más adentro. El snippet puede
/// comunicar su salida con `return` o asignando la variable `result`;
/// si no hace ninguna de las dos, la salida es `None`.
fn wrap_code(code: &str) -> String {
    // El host externo puede mandar finales CRLF; se normalizan antes
    // de reindentar para no dejar `\r` colgando en cada línea.
    let code = code.replace("\r\n", "\n");
    let indented = code.split('\n')
                       .map(|line| format!("    {line}"))
                       .collect::<Vec<_>>()
                       .join("\n");
    format!("def f(inputs):\n{indented}\n    return locals().get('result')\nresult = f(_inputs)")
}

/// Ejecuta el snippet en un scope recién creado y extrae `result`.
///
/// Forma "cruda" que propaga `PyErr`; sólo la fachada la convierte en
/// `Envelope`. El scope contiene únicamente `_inputs` (más los builtins
/// implícitos del intérprete) y se descarta al terminar, ninguna llamada
/// ve estado de otra.
pub(crate) fn exec_snippet(code: &str, inputs: &Value) -> PyResult<Value> {
    let wrapped = CString::new(wrap_code(code))?;
    Python::attach(|py| {
        let json = py.import("json")?;
        let inputs_str = serde_json::to_string(inputs).map_err(|e| {
                             PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("Serialization error: {}", e))
                         })?;
        let bound_inputs = json.call_method1("loads", (inputs_str,))?;

        let scope = PyDict::new(py);
        scope.set_item("_inputs", bound_inputs)?;
        py.run(wrapped.as_c_str(), Some(&scope), None)?;

        match scope.get_item("result")? {
            None => Ok(Value::Null),
            Some(obj) => {
                let json_str: String = json.call_method1("dumps", (obj,))?.extract()?;
                let value: Value = serde_json::from_str(&json_str).map_err(|e| {
                                       PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("Deserialization error: {}", e))
                                   })?;
                Ok(value)
            }
        }
    })
}
