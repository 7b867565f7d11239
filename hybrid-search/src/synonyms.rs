/// Static synonym table for code-search vocabulary.
///
/// Lookups are on lower-cased terms; unknown terms have no synonyms.
pub fn synonyms_for(term: &str) -> &'static [&'static str] {
    match term {
        "function" | "func" | "fn" => &["function", "method", "func", "fn"],
        "method" => &["method", "function"],
        "class" => &["class", "type", "struct"],
        "struct" => &["struct", "class", "type"],
        "error" | "err" => &["error", "exception", "err", "failure"],
        "exception" => &["exception", "error"],
        "get" | "fetch" | "retrieve" => &["get", "fetch", "retrieve", "find"],
        "find" | "search" => &["find", "search", "lookup", "get"],
        "create" | "make" => &["create", "make", "new", "add"],
        "delete" | "remove" => &["delete", "remove", "destroy"],
        "update" | "modify" => &["update", "modify", "edit", "change"],
        "user" | "account" => &["user", "account", "member"],
        "auth" | "authentication" | "login" => &["auth", "authentication", "login", "signin"],
        "config" | "configuration" | "settings" => &["config", "configuration", "settings", "options"],
        "test" | "spec" => &["test", "spec"],
        "async" | "promise" => &["async", "await", "promise"],
        "db" | "database" => &["db", "database", "storage"],
        "request" | "req" => &["request", "req"],
        "response" | "res" => &["response", "res"],
        "component" | "widget" => &["component", "widget", "view"],
        _ => &[],
    }
}
