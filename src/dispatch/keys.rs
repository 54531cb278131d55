//! Translation of model-facing key names to browser key names.
//!
//! Models send keys in a few dialects: X11 keysyms (`Return`, `BackSpace`,
//! `Page_Up`), WebDriver style upper case names (`ENTER`, `ARROWLEFT`) and
//! DOM names (`Enter`, `ArrowLeft`). All of them resolve to DOM key names.
//! Anything unrecognised is passed through literally.

/// Resolves one key token.
pub fn resolve(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.chars().count() == 1 {
        return trimmed.to_string();
    }
    let normalized: String = trimmed
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect();

    let named = match normalized.as_str() {
        "return" | "enter" | "kpenter" => "Enter",
        "backspace" => "Backspace",
        "tab" => "Tab",
        "escape" | "esc" => "Escape",
        "space" => " ",
        "delete" | "del" => "Delete",
        "insert" => "Insert",
        "home" => "Home",
        "end" => "End",
        "pageup" | "prior" => "PageUp",
        "pagedown" | "next" => "PageDown",
        "up" | "arrowup" => "ArrowUp",
        "down" | "arrowdown" => "ArrowDown",
        "left" | "arrowleft" => "ArrowLeft",
        "right" | "arrowright" => "ArrowRight",
        "ctrl" | "control" | "controll" | "controlr" => "Control",
        "shift" | "shiftl" | "shiftr" => "Shift",
        "alt" | "altl" | "altr" | "option" => "Alt",
        "super" | "superl" | "meta" | "cmd" | "command" | "win" => "Meta",
        _ => return function_key(&normalized).unwrap_or_else(|| trimmed.to_string()),
    };
    named.to_string()
}

/// Splits a chord such as `ctrl+shift+t` into resolved keys, in order.
pub fn resolve_chord(chord: &str) -> Vec<String> {
    if chord.trim() == "+" {
        return vec!["+".to_string()];
    }
    chord
        .split('+')
        .filter(|part| !part.trim().is_empty())
        .map(resolve)
        .collect()
}

fn function_key(normalized: &str) -> Option<String> {
    let number: u8 = normalized.strip_prefix('f')?.parse().ok()?;
    (1..=12).contains(&number).then(|| format!("F{number}"))
}
