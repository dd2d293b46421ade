/// One line of user input, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Quit,
    Clear,
    ToggleReasoning,
    SetModel(String),
    Query(String),
    Empty,
}

impl Command {
    /// Classify a line. Keywords are matched case-insensitively after trimming;
    /// anything unrecognised is a query, passed on trimmed but otherwise verbatim.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }

        let lower = trimmed.to_lowercase();
        match lower.as_str() {
            "quit" | "exit" => return Self::Quit,
            "clear" => return Self::Clear,
            "reasoning" => return Self::ToggleReasoning,
            _ => {}
        }

        if let Some((keyword, rest)) = trimmed.split_once(char::is_whitespace) {
            let id = rest.trim();
            if keyword.eq_ignore_ascii_case("model") && !id.is_empty() {
                return Self::SetModel(id.to_string());
            }
        }

        Self::Query(trimmed.to_string())
    }
}
