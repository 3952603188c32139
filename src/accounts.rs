use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// Registered users, kept as `username,password` lines without a header.
pub struct Accounts {
    path: PathBuf,
    users: HashMap<String, String>,
    order: Vec<String>,
}

impl Accounts {
    /// Load the user file. A missing file means nobody has registered yet.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut accounts = Self {
            path,
            users: HashMap::new(),
            order: Vec::new(),
        };
        if !accounts.path.exists() {
            return Ok(accounts);
        }

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(File::open(&accounts.path)?);
        for record in rdr.records() {
            let record = record?;
            if let (Some(name), Some(password)) = (record.get(0), record.get(1)) {
                accounts.insert(name.to_string(), password.to_string());
            }
        }
        Ok(accounts)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn contains(&self, username: &str) -> bool {
        self.users.contains_key(username)
    }

    pub fn register(&mut self, username: &str, password: &str) -> Result<(), StoreError> {
        if username.is_empty() {
            return Err(StoreError::InvalidAccount(
                "user name must not be empty".to_string(),
            ));
        }
        if self.contains(username) {
            return Err(StoreError::UserExists(username.to_string()));
        }
        self.insert(username.to_string(), password.to_string());
        self.save()
    }

    pub fn login(&self, username: &str, password: &str) -> Result<(), StoreError> {
        match self.users.get(username) {
            Some(stored) if stored == password => Ok(()),
            _ => Err(StoreError::InvalidCredentials),
        }
    }

    fn insert(&mut self, username: String, password: String) {
        if self.users.insert(username.clone(), password).is_none() {
            self.order.push(username);
        }
    }

    fn save(&self) -> Result<(), StoreError> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(File::create(&self.path)?);
        for name in &self.order {
            wtr.write_record([name.as_str(), self.users[name].as_str()])?;
        }
        wtr.flush()?;
        Ok(())
    }
}
