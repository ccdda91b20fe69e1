// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 webdevops contributors

//! Intrinsic functions
//!
//! Values the provisioning engine resolves at deploy time.

use serde::{Serialize, Serializer};
use serde_json::{json, Value};

use crate::stack::naming;
use crate::stack::resources::Handle;

/// A template value, literal or resolved by the engine
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(String),
    Ref(String),
    GetAtt(String, String),
    Sub(String),
    Join(String, Vec<Expr>),
    Select(u32, Box<Expr>),
    Split(String, Box<Expr>),
}

impl Expr {
    /// Physical name; substituted by the engine if it holds pseudo parameters
    pub fn name(name: &str) -> Self {
        if naming::is_deferred(name) {
            Self::Sub(name.to_string())
        } else {
            Self::Literal(name.to_string())
        }
    }

    pub fn reference<T>(handle: &Handle<T>) -> Self {
        Self::Ref(handle.id().to_string())
    }

    pub fn attribute<T>(handle: &Handle<T>, attribute: &str) -> Self {
        Self::GetAtt(handle.id().to_string(), attribute.to_string())
    }

    /// `<arn>/*`, every object in a bucket
    pub fn objects_of<T>(handle: &Handle<T>) -> Self {
        Self::Join(
            String::new(),
            vec![Self::attribute(handle, "Arn"), Self::Literal("/*".into())],
        )
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Literal(s) => Value::String(s.clone()),
            Self::Ref(id) => json!({ "Ref": id }),
            Self::GetAtt(id, attr) => json!({ "Fn::GetAtt": [id, attr] }),
            Self::Sub(s) => json!({ "Fn::Sub": s }),
            Self::Join(sep, parts) => {
                let parts: Vec<Value> = parts.iter().map(Expr::to_value).collect();
                json!({ "Fn::Join": [sep, parts] })
            }
            Self::Select(index, expr) => json!({ "Fn::Select": [index, expr.to_value()] }),
            Self::Split(sep, expr) => json!({ "Fn::Split": [sep, expr.to_value()] }),
        }
    }
}

impl Serialize for Expr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl From<Expr> for Value {
    fn from(expr: Expr) -> Self {
        expr.to_value()
    }
}

/// Dynamic reference to a secret's value, resolved by the engine
pub fn secret_reference(secret_name: &str) -> String {
    format!("{{{{resolve:secretsmanager:{}:SecretString:::}}}}", secret_name)
}
