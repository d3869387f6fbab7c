//! Host functions installed into the global environment before a program runs.

use std::rc::Rc;

use chrono::Utc;
use log::debug;

use crate::environment::Environment;
use crate::value::{NativeFunction, Value};

/// `clock()`: seconds since the Unix epoch, with millisecond resolution.
pub fn clock() -> NativeFunction {
    NativeFunction {
        name: "clock",
        arity: 0,
        func: |_args: &[Value]| {
            let millis: i64 = Utc::now().timestamp_millis();
            Value::Number(millis as f64 / 1000.0)
        },
    }
}

/// Every native the language provides.
pub fn all() -> Vec<NativeFunction> {
    vec![clock()]
}

/// Define each native under its name in `globals`.
pub fn install(globals: &mut Environment) {
    for native in all() {
        debug!("Defining native function '{}'", native.name);

        globals.define(native.name, Value::NativeFunction(Rc::new(native)));
    }
}
