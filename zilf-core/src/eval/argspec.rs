// zilf-core - Argument list parsing
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Parsing argument lists: `(A 'B C:FIX "OPT" (D 1) "ARGS" R "AUX" E)`.

use zilf_value::{ArgItem, ArgSpec, AtomId, ZilVal};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Section {
    Required,
    Optional,
    Rest,
    Aux,
}

fn section_for(marker: &str) -> Option<Section> {
    match marker {
        "OPT" | "OPTIONAL" => Some(Section::Optional),
        "ARGS" | "TUPLE" => Some(Section::Rest),
        "AUX" | "EXTRA" => Some(Section::Aux),
        _ => None,
    }
}

/// Parse a parameter: `X`, `'X`, `X:DECL` or `'X:DECL`.
fn parse_param(form: &'static str, value: &ZilVal, quote: AtomId) -> Result<ArgItem> {
    match value.unlocated() {
        ZilVal::Atom(atom) => Ok(ArgItem::new(*atom)),
        ZilVal::Form(items, _)
            if items.len() == 2 && items.front().and_then(ZilVal::as_atom) == Some(quote) =>
        {
            match items.get(1).map(ZilVal::unlocated) {
                Some(ZilVal::Atom(atom)) => {
                    let mut item = ArgItem::new(*atom);
                    item.quoted = true;
                    Ok(item)
                }
                _ => Err(Error::syntax(form, "quoted parameter must be an atom")),
            }
        }
        ZilVal::Adecl(adecl, _) => {
            let mut item = parse_param(form, &adecl.value, quote)?;
            if item.decl.is_some() {
                return Err(Error::syntax(form, "parameter declared twice"));
            }
            item.decl = Some(adecl.decl.clone());
            Ok(item)
        }
        other => Err(Error::syntax(
            form,
            format!("parameter must be an atom, not {}", other.type_name()),
        )),
    }
}

/// Parse `(param default)` in the OPT and AUX sections.
fn parse_defaulted(form: &'static str, value: &ZilVal, quote: AtomId) -> Result<ArgItem> {
    match value.unlocated() {
        ZilVal::List(items, _) => {
            if items.len() != 2 {
                return Err(Error::syntax(
                    form,
                    "defaulted parameter must be (name default)",
                ));
            }
            let mut item = parse_param(form, &items[0], quote)?;
            item.default = Some(items[1].clone());
            Ok(item)
        }
        other => parse_param(form, other, quote),
    }
}

/// Parse an argument list value into an [`ArgSpec`].
///
/// `form` names the construct for error messages; `quote` is the QUOTE atom.
pub fn parse_arg_spec(form: &'static str, list: &ZilVal, quote: AtomId) -> Result<ArgSpec> {
    let ZilVal::List(items, _) = list.unlocated() else {
        return Err(Error::syntax(
            form,
            format!("argument list must be a LIST, not {}", list.type_name()),
        ));
    };

    let mut spec = ArgSpec::default();
    let mut section = Section::Required;

    for item in items {
        if let ZilVal::String(marker) = item.unlocated() {
            let next = section_for(marker).ok_or_else(|| {
                Error::syntax(form, format!("unrecognized argument list marker \"{}\"", marker))
            })?;
            if next <= section {
                return Err(Error::syntax(
                    form,
                    format!("\"{}\" out of order", marker),
                ));
            }
            if section == Section::Rest && spec.rest.is_none() {
                return Err(Error::syntax(form, "\"ARGS\" needs a parameter"));
            }
            section = next;
            continue;
        }

        match section {
            Section::Required => spec.required.push(parse_param(form, item, quote)?),
            Section::Optional => spec.optional.push(parse_defaulted(form, item, quote)?),
            Section::Rest => {
                if spec.rest.is_some() {
                    return Err(Error::syntax(form, "only one \"ARGS\" parameter allowed"));
                }
                spec.rest = Some(parse_param(form, item, quote)?);
            }
            Section::Aux => spec.aux.push(parse_defaulted(form, item, quote)?),
        }
    }

    if section == Section::Rest && spec.rest.is_none() {
        return Err(Error::syntax(form, "\"ARGS\" needs a parameter"));
    }
    Ok(spec)
}
