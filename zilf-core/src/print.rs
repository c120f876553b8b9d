// zilf-core - Value printing
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Printed representation of values, for diagnostics and `SPNAME`-style
//! output. Atoms print through the symbol table so names hidden by the
//! current search path come out qualified.

use std::fmt::Write;

use zilf_value::ZilVal;

use crate::oblist::SymbolTable;

/// Print a value the way the reader would accept it back, where possible.
///
/// A record that contains itself prints the inner occurrence as
/// `#TYPE ...`.
#[must_use]
pub fn format_value(syms: &SymbolTable, value: &ZilVal) -> String {
    let mut printer = Printer {
        syms,
        out: String::new(),
        open_records: Vec::new(),
    };
    printer.value(value);
    printer.out
}

struct Printer<'a> {
    syms: &'a SymbolTable,
    out: String,
    /// Records being printed, outermost first.
    open_records: Vec<usize>,
}

impl Printer<'_> {
    fn seq<'v>(&mut self, open: &str, items: impl IntoIterator<Item = &'v ZilVal>, close: &str) {
        self.out.push_str(open);
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.out.push(' ');
            }
            self.value(item);
        }
        self.out.push_str(close);
    }

    fn value(&mut self, value: &ZilVal) {
        let syms = self.syms;
        match value.unlocated() {
            ZilVal::Atom(a) => self.out.push_str(&syms.display(*a)),
            ZilVal::Fix(n) => {
                let _ = write!(self.out, "{}", n);
            }
            ZilVal::Char(c) => {
                let _ = write!(self.out, "!\\{}", c);
            }
            ZilVal::String(s) => {
                self.out.push('"');
                for c in s.chars() {
                    if c == '"' || c == '\\' {
                        self.out.push('\\');
                    }
                    self.out.push(c);
                }
                self.out.push('"');
            }
            ZilVal::False(items) if items.is_empty() => self.out.push_str("<>"),
            ZilVal::False(items) => self.seq("#FALSE (", items, ")"),
            ZilVal::List(items, _) => self.seq("(", items, ")"),
            ZilVal::Form(items, _) => self.seq("<", items, ">"),
            ZilVal::Vector(items, _) => self.seq("[", items, "]"),
            ZilVal::Splice(items) => self.seq("#SPLICE (", items, ")"),
            ZilVal::Adecl(adecl, _) => {
                self.value(&adecl.value);
                self.out.push(':');
                self.value(&adecl.decl);
            }
            ZilVal::Subr(b) | ZilVal::Fsubr(b) => {
                let _ = write!(self.out, "#{} {}", value.type_name(), b.name());
            }
            ZilVal::Function(f) => {
                self.out.push_str("#FUNCTION (");
                if let Some(name) = f.name {
                    self.out.push_str(&syms.display(name));
                    self.out.push(' ');
                }
                let quote = syms.std(zilf_value::StdAtom::Quote);
                self.value(&f.spec.to_list(quote));
                for item in &f.body {
                    self.out.push(' ');
                    self.value(item);
                }
                self.out.push(')');
            }
            ZilVal::Macro(inner) => {
                self.out.push_str("#MACRO (");
                self.value(inner);
                self.out.push(')');
            }
            ZilVal::Struct(r) => {
                let type_name = r.layout().type_name();
                if self.open_records.contains(&r.record_addr()) {
                    let _ = write!(self.out, "#{} ...", type_name);
                    return;
                }
                self.open_records.push(r.record_addr());
                let items: Vec<ZilVal> = r.iter().collect();
                self.seq(&format!("#{} (", type_name), &items, ")");
                self.open_records.pop();
            }
            ZilVal::Asoc(cursor) => {
                let _ = write!(self.out, "#ASOC {}", cursor);
            }
            ZilVal::ObList(ol) => {
                let _ = write!(self.out, "#OBLIST {}", syms.oblist_display(*ol));
            }
            ZilVal::Located(l) => self.value(&l.value),
        }
    }
}
