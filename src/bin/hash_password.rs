//! Print the argon2 hash of a password, for seeding accounts by hand.
//!
//! Usage: `hash-password <password>`

use library_server::services::credentials::hash_password;

fn main() -> anyhow::Result<()> {
    let Some(password) = std::env::args().nth(1) else {
        eprintln!("Usage: hash-password <password>");
        std::process::exit(2);
    };

    let hash = hash_password(&password)?;
    println!("{}", hash);
    Ok(())
}
