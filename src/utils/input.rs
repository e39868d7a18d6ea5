use std::io;
use std::io::Write;

use rpassword::read_password;

pub fn input(prompt: &str) -> io::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?; // the prompt has no newline

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Reads a line without echoing it.
pub fn input_password(prompt: &str) -> io::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    Ok(read_password()?.trim().to_string())
}
