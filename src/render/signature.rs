// Signature and type formatting
//
// Turns the extractor's structured type records into TypeScript-like text.
// Output is plain text; escaping is left to the template.

use crate::model::{DocValue, Kind};

fn str_field<'a>(value: &'a DocValue, key: &str) -> Option<&'a str> {
    value.get(key).and_then(DocValue::as_str)
}

fn list_field<'a>(value: &'a DocValue, key: &str) -> &'a [DocValue] {
    value.get(key).and_then(DocValue::as_list).unwrap_or(&[])
}

fn join_types(types: &[DocValue], sep: &str) -> String {
    types.iter().map(format_type).collect::<Vec<_>>().join(sep)
}

/// Format a type record
pub fn format_type(ty: &DocValue) -> String {
    let name = || str_field(ty, "name").unwrap_or("unknown").to_string();

    match str_field(ty, "type") {
        Some("intrinsic") | Some("unknown") => name(),
        Some("reference") => {
            let args = list_field(ty, "typeArguments");
            if args.is_empty() {
                name()
            } else {
                format!("{}<{}>", name(), join_types(args, ", "))
            }
        }
        Some("array") => match ty.get("elementType") {
            Some(elem) => {
                let inner = format_type(elem);
                if needs_parens(elem) {
                    format!("({})[]", inner)
                } else {
                    format!("{}[]", inner)
                }
            }
            None => "unknown[]".to_string(),
        },
        Some("union") => join_types(list_field(ty, "types"), " | "),
        Some("intersection") => join_types(list_field(ty, "types"), " & "),
        Some("tuple") => format!("[{}]", join_types(list_field(ty, "elements"), ", ")),
        Some("literal") => match ty.get("value") {
            Some(v) => match v.as_str() {
                Some(s) => format!("\"{}\"", s),
                None => match v.to_json() {
                    serde_json::Value::Null => "null".to_string(),
                    other => other.to_string(),
                },
            },
            None => "undefined".to_string(),
        },
        Some("query") => match ty.get("queryType") {
            Some(q) => format!("typeof {}", format_type(q)),
            None => "unknown".to_string(),
        },
        Some("typeOperator") => {
            let operator = str_field(ty, "operator").unwrap_or("keyof");
            match ty.get("target") {
                Some(target) => format!("{} {}", operator, format_type(target)),
                None => operator.to_string(),
            }
        }
        Some("indexedAccess") => {
            let object = ty.get("objectType").map(format_type).unwrap_or_default();
            let index = ty.get("indexType").map(format_type).unwrap_or_default();
            format!("{}[{}]", object, index)
        }
        Some("conditional") => {
            let part = |key: &str| ty.get(key).map(format_type).unwrap_or_default();
            format!(
                "{} extends {} ? {} : {}",
                part("checkType"),
                part("extendsType"),
                part("trueType"),
                part("falseType")
            )
        }
        Some("predicate") => {
            let target = ty.get("targetType").map(format_type);
            let asserts = ty
                .get("asserts")
                .and_then(DocValue::as_bool)
                .unwrap_or(false);
            match (asserts, target) {
                (true, Some(t)) => format!("asserts {} is {}", name(), t),
                (true, None) => format!("asserts {}", name()),
                (false, Some(t)) => format!("{} is {}", name(), t),
                (false, None) => "boolean".to_string(),
            }
        }
        Some("reflection") => match ty.get("declaration") {
            Some(decl) => format_declaration(decl),
            None => "object".to_string(),
        },
        _ => str_field(ty, "name").unwrap_or("unknown").to_string(),
    }
}

fn needs_parens(ty: &DocValue) -> bool {
    matches!(
        str_field(ty, "type"),
        Some("union") | Some("intersection") | Some("conditional")
    ) || (str_field(ty, "type") == Some("reflection")
        && ty
            .get_path(["declaration", "signatures"])
            .is_some_and(|s| s.as_list().is_some_and(|l| !l.is_empty())))
}

// Inline object or function type
fn format_declaration(decl: &DocValue) -> String {
    if let Some(sig) = list_field(decl, "signatures").first() {
        let ret = sig.get("type").map(format_type).unwrap_or_else(|| "void".to_string());
        return format!("({}) => {}", format_parameters(sig), ret);
    }

    let fields: Vec<String> = list_field(decl, "children")
        .iter()
        .map(|child| {
            let name = str_field(child, "name").unwrap_or("?");
            let optional = child
                .get_path(["flags", "isOptional"])
                .and_then(DocValue::as_bool)
                .unwrap_or(false);
            let ty = child.get("type").map(format_type).unwrap_or_else(|| "any".to_string());
            format!("{}{}: {}", name, if optional { "?" } else { "" }, ty)
        })
        .collect();

    if fields.is_empty() {
        "object".to_string()
    } else {
        format!("{{ {} }}", fields.join("; "))
    }
}

fn format_parameters(sig: &DocValue) -> String {
    list_field(sig, "parameters")
        .iter()
        .map(|param| {
            let flag = |key: &str| {
                param
                    .get_path(["flags", key])
                    .and_then(DocValue::as_bool)
                    .unwrap_or(false)
            };
            let name = str_field(param, "name").unwrap_or("arg");
            let ty = param.get("type").map(format_type).unwrap_or_else(|| "any".to_string());
            let rest = if flag("isRest") { "..." } else { "" };
            let optional = if flag("isOptional") || param.get("defaultValue").is_some() {
                "?"
            } else {
                ""
            };
            format!("{}{}{}: {}", rest, name, optional, ty)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_type_parameters(sig: &DocValue) -> String {
    // Older extractor output uses the singular key.
    let params = match list_field(sig, "typeParameters") {
        [] => list_field(sig, "typeParameter"),
        params => params,
    };
    if params.is_empty() {
        return String::new();
    }
    let names: Vec<String> = params
        .iter()
        .map(|p| {
            let name = str_field(p, "name").unwrap_or("T");
            match p.get("type") {
                Some(constraint) => format!("{} extends {}", name, format_type(constraint)),
                None => name.to_string(),
            }
        })
        .collect();
    format!("<{}>", names.join(", "))
}

/// Format a signature record, or the declaration line of a value-like
/// member (property, variable, parameter, enum member, type alias, accessor)
pub fn format_signature(sig: &DocValue) -> String {
    let name = str_field(sig, "name").unwrap_or("");
    let kind = Kind::from_value(sig.get("kind"));
    let ret = sig.get("type").map(format_type);

    match kind {
        Kind::ConstructorSignature => format!(
            "new {}{}({})",
            name.trim_start_matches("new "),
            format_type_parameters(sig),
            format_parameters(sig)
        ),
        Kind::Property | Kind::Variable | Kind::Parameter => {
            let optional = sig
                .get_path(["flags", "isOptional"])
                .and_then(DocValue::as_bool)
                .unwrap_or(false);
            let ty = ret.unwrap_or_else(|| "any".into());
            format!("{}{}: {}", name, if optional { "?" } else { "" }, ty)
        }
        Kind::EnumMember => match ret {
            Some(value) => format!("{} = {}", name, value),
            None => name.to_string(),
        },
        Kind::TypeAlias => format!(
            "type {}{} = {}",
            name,
            format_type_parameters(sig),
            ret.unwrap_or_else(|| "unknown".into())
        ),
        Kind::Accessor => {
            // Newer extractor output stores a single record, older a list.
            let getter = sig.get("getSignature").and_then(|g| match g {
                DocValue::List(items) => items.first(),
                other => Some(other),
            });
            match getter.and_then(|g| g.get("type")) {
                Some(ty) => format!("get {}(): {}", name, format_type(ty)),
                None => name.to_string(),
            }
        }
        Kind::GetSignature => format!("get {}(): {}", name, ret.unwrap_or_else(|| "any".into())),
        Kind::SetSignature => format!("set {}({})", name, format_parameters(sig)),
        _ => {
            let head = format!(
                "{}{}({})",
                name,
                format_type_parameters(sig),
                format_parameters(sig)
            );
            match ret {
                Some(r) => format!("{}: {}", head, r),
                None => head,
            }
        }
    }
}
