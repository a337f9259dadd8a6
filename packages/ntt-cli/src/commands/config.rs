//! `ntt config`

use eyre::Result;
use ntt_rs::Chain;

use crate::config::ConfigFile;

pub fn set_chain(file: &ConfigFile, chain: Chain, key: &str, value: &str) -> Result<()> {
    file.set_chain(chain, key, value)?;
    println!("Set {} {} in {}", chain, key, file.path().display());
    Ok(())
}

pub fn unset_chain(file: &ConfigFile, chain: Chain, key: &str) -> Result<()> {
    if file.unset_chain(chain, key)? {
        println!("Removed {} {} from {}", chain, key, file.path().display());
    } else {
        println!("{} {} was not set", chain, key);
    }
    Ok(())
}

pub fn get_chain(file: &ConfigFile, chain: Chain, key: &str) -> Result<Option<String>> {
    let value = file.get_chain(chain, key)?;
    match &value {
        Some(value) => println!("{}", value),
        None => eprintln!("{} {} is not set", chain, key),
    }
    Ok(value)
}
