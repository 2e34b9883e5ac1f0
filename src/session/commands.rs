use crate::models::Direction;

/// Presentation-layer commands accepted by the session controller.
///
/// Everything that mutates the engine travels through this enum so the
/// mutation stays on the controller's task.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Deposit(f64),
    Open { direction: Direction, units: f64 },
    Close,
    Quit,
}

/// Parse one raw input line into a command.
///
/// Rejection happens here, before any state can change; the engine applies
/// its own range checks on top.
pub fn parse_line(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let verb = parts.next().ok_or_else(|| "empty command".to_string())?;

    let command = match verb.to_ascii_lowercase().as_str() {
        "deposit" => {
            let raw = parts.next().ok_or_else(|| "usage: deposit <amount>".to_string())?;
            Command::Deposit(parse_number(raw)?)
        }
        "open" => {
            let direction: Direction = parts
                .next()
                .ok_or_else(|| "usage: open long|short <units>".to_string())?
                .parse()?;
            let raw = parts.next().ok_or_else(|| "usage: open long|short <units>".to_string())?;
            Command::Open {
                direction,
                units: parse_number(raw)?,
            }
        }
        "buy" | "sell" => {
            let direction = if verb.eq_ignore_ascii_case("buy") {
                Direction::Long
            } else {
                Direction::Short
            };
            let raw = parts.next().ok_or_else(|| format!("usage: {} <units>", verb))?;
            Command::Open {
                direction,
                units: parse_number(raw)?,
            }
        }
        "close" => Command::Close,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command: {}", other)),
    };

    if parts.next().is_some() {
        return Err(format!("trailing input after {} command", verb));
    }
    Ok(command)
}

/// Parse a user-entered number, tolerating a currency sign and thousands
/// separators.
fn parse_number(raw: &str) -> Result<f64, String> {
    let cleaned = raw
        .trim()
        .trim_start_matches(['$', '€'])
        .replace(',', "");
    cleaned
        .parse::<f64>()
        .map_err(|_| format!("wrong number: {}", raw))
}
