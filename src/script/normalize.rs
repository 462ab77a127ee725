//! Textual cleanup applied before parsing: markdown fences and module linkage lines.

/// Strip a surrounding markdown code fence and every `import`/`export` statement line.
///
/// `export` modifiers in front of declarations are dropped and the declaration kept
/// (`export const A = ...` becomes `const A = ...`). `export default X;` referring to an existing
/// binding is removed outright; `export default function Main()` keeps the function.
pub(crate) fn normalize(src: &str) -> String {
    let body = strip_fence(src);
    let mut out = String::with_capacity(body.len());
    let mut lines = body.lines().peekable();
    while let Some(line) = lines.next() {
        let trimmed = line.trim_start();
        if is_statement(trimmed, "import") {
            // Multi-line `import { a,\n b } from "x"` runs until the `from` clause.
            if !import_complete(trimmed) {
                for next in lines.by_ref() {
                    if import_complete(next) {
                        break;
                    }
                }
            }
            out.push('\n');
            continue;
        }
        if is_statement(trimmed, "export") {
            let indent = &line[..line.len() - trimmed.len()];
            match strip_export(trimmed) {
                Some(rest) => {
                    out.push_str(indent);
                    out.push_str(rest);
                }
                None => {
                    if trimmed.starts_with("export {") && !trimmed.contains('}') {
                        for next in lines.by_ref() {
                            if next.contains('}') {
                                break;
                            }
                        }
                    }
                }
            }
            out.push('\n');
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn is_statement(line: &str, kw: &str) -> bool {
    line.strip_prefix(kw).is_some_and(|rest| {
        rest.starts_with(|c: char| c.is_whitespace() || c == '{' || c == '*' || c == '"' || c == '\'')
    })
}

fn import_complete(line: &str) -> bool {
    let t = line.trim();
    // Side-effect imports (`import "x"`) are complete on one line.
    t.contains(" from ")
        || t.contains("}from")
        || t.starts_with("import \"")
        || t.starts_with("import '")
        || t.ends_with(';')
}

/// Returns the declaration left after dropping the `export` keyword, or `None` when the whole
/// line is linkage only.
fn strip_export(line: &str) -> Option<&str> {
    let rest = line["export".len()..].trim_start();
    if rest.starts_with('{') || rest.starts_with('*') {
        return None;
    }
    if let Some(after) = rest.strip_prefix("default") {
        let after = after.trim_start();
        let is_decl = ["function", "async ", "class ", "const ", "let ", "("]
            .iter()
            .any(|p| after.starts_with(p));
        // `export default Main;` names an existing binding.
        return is_decl.then_some(after);
    }
    Some(rest)
}

fn strip_fence(src: &str) -> &str {
    let trimmed = src.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return src;
    };
    // Drop the info string (`tsx`, `jsx`, ...).
    let body = match after_open.find('\n') {
        Some(i) => &after_open[i + 1..],
        None => "",
    };
    // A fence that has not been closed yet is normal while streaming.
    match body.trim_end().strip_suffix("```") {
        Some(inner) => inner,
        None => body,
    }
}
