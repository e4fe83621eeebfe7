//! Masked password input on the controlling terminal.

use std::io::{Stderr, Write};

use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal::{self, ClearType},
};

use crate::CliResult;

/// How many times the operator may fail the confirmation.
const ATTEMPTS: usize = 3;

/// Raw mode for as long as the guard lives.
struct RawMode;

impl RawMode {
    fn enter() -> CliResult<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn notice(out: &mut Stderr, message: &str) -> CliResult<()> {
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(message),
        Print("\r\n")
    )?;
    Ok(())
}

fn read_masked(prompt: &str) -> CliResult<String> {
    let _raw = RawMode::enter()?;
    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;

    let mut secret = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => break,
            KeyCode::Backspace if secret.pop().is_some() => {
                execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                secret.push(ch);
                execute!(out, Print("*"))?;
            }
            _ => continue,
        }
        out.flush()?;
    }

    execute!(out, Print("\r\n"))?;
    Ok(secret)
}

/// Ask for a non-empty password and its confirmation.
pub fn new_password() -> CliResult<String> {
    let mut out = std::io::stderr();
    for _ in 0..ATTEMPTS {
        let first = read_masked("Password: ")?;
        if first.is_empty() {
            notice(&mut out, "Password must not be empty.")?;
            continue;
        }
        if read_masked("Repeat password: ")? == first {
            return Ok(first);
        }
        notice(&mut out, "Passwords differ, try again.")?;
    }
    Err("too many attempts".into())
}
