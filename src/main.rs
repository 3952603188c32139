// main.rs

use anyhow::{Context, Result};
use colored::*;
use log::info;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::str::FromStr;

use stock_portfolio::accounts::Accounts;
use stock_portfolio::broker::Client;
use stock_portfolio::config::Config;
use stock_portfolio::report;
use stock_portfolio::StoreError;

/// Line-oriented console input. `None` means stdin was closed.
struct Prompt<R> {
    lines: io::Lines<R>,
}

impl<R: BufRead> Prompt<R> {
    fn new(input: R) -> Self {
        Self {
            lines: input.lines(),
        }
    }

    fn ask(&mut self, label: &str) -> Result<Option<String>> {
        print!("{}", label);
        io::stdout().flush()?;
        match self.lines.next() {
            Some(line) => Ok(Some(line?.trim().to_string())),
            None => Ok(None),
        }
    }

    fn ask_parsed<T: FromStr>(&mut self, label: &str) -> Result<Option<T>> {
        loop {
            let Some(answer) = self.ask(label)? else {
                return Ok(None);
            };
            match answer.parse() {
                Ok(value) => return Ok(Some(value)),
                Err(_) => println!("{}", format!("'{}' is not a valid number.", answer).yellow()),
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let config = Config::from_env().context("load configuration")?;
    info!("Using data directory {}", config.data_dir.display());
    let mut accounts = Accounts::load(config.users_path())
        .with_context(|| format!("load users from {}", config.users_path().display()))?;

    let stdin = io::stdin();
    let mut prompt = Prompt::new(stdin.lock());

    loop {
        println!("\n{}", "📈 STOCK MARKET SYSTEM 📉".bold());
        let Some(choice) = prompt.ask("1: Register | 2: Login | 3: Exit\nChoose: ")? else {
            break;
        };
        match choice.as_str() {
            "1" => register(&mut prompt, &mut accounts)?,
            "2" => {
                let Some(username) = login(&mut prompt, &accounts)? else {
                    continue;
                };
                let mut client = Client::open(&config, &username)
                    .with_context(|| format!("open portfolio of {}", username))?;
                manage_stocks(&mut prompt, &mut client)?;
            }
            "3" => {
                println!("Exiting program...");
                break;
            }
            _ => println!("{}", "Invalid choice! Please try again.".yellow()),
        }
    }
    Ok(())
}

fn register<R: BufRead>(prompt: &mut Prompt<R>, accounts: &mut Accounts) -> Result<()> {
    let Some(username) = prompt.ask("Enter user name: ")? else {
        return Ok(());
    };
    let Some(password) = prompt.ask("Enter password: ")? else {
        return Ok(());
    };
    match accounts.register(&username, &password) {
        Ok(()) => println!("{}", format!("User '{}' registered successfully!", username).green()),
        Err(e @ (StoreError::UserExists(_) | StoreError::InvalidAccount(_))) => {
            println!("{}", e.to_string().yellow())
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn login<R: BufRead>(prompt: &mut Prompt<R>, accounts: &Accounts) -> Result<Option<String>> {
    let Some(username) = prompt.ask("Enter user name: ")? else {
        return Ok(None);
    };
    let Some(password) = prompt.ask("Enter password: ")? else {
        return Ok(None);
    };
    match accounts.login(&username, &password) {
        Ok(()) => {
            println!("{}", format!("Login successful for {}!", username).green());
            Ok(Some(username))
        }
        Err(e) => {
            println!("{}", e.to_string().red());
            Ok(None)
        }
    }
}

fn manage_stocks<R: BufRead>(prompt: &mut Prompt<R>, client: &mut Client) -> Result<()> {
    loop {
        println!("\n{}", "Stock Management:".bold());
        println!("1. View Portfolio");
        println!("2. Buy Stock");
        println!("3. Sell Stock");
        println!("4. Search Stock");
        println!("5. View Trading Performance");
        println!("6. View Transaction History");
        println!("7. Export Portfolio to CSV");
        println!("8. Logout");
        let Some(choice) = prompt.ask("Enter choice: ")? else {
            client.save()?;
            return Ok(());
        };

        match choice.as_str() {
            "1" => print!("{}", report::render_portfolio(client.portfolio())),
            "2" => buy_stock(prompt, client)?,
            "3" => sell_stock(prompt, client)?,
            "4" => {
                let Some(symbol) = prompt.ask("Enter stock name to search: ")? else {
                    continue;
                };
                print!("{}", report::render_search(&symbol, client.portfolio().search(&symbol)));
            }
            "5" => print!("{}", report::render_performance(client.performance())),
            "6" => print!("{}", report::render_history(&client.history()?)),
            "7" => export_portfolio(prompt, client)?,
            "8" => {
                println!("Logging out...");
                client.save()?;
                return Ok(());
            }
            _ => println!("{}", "Invalid choice. Please try again.".yellow()),
        }
    }
}

fn buy_stock<R: BufRead>(prompt: &mut Prompt<R>, client: &mut Client) -> Result<()> {
    let Some(symbol) = prompt.ask("Enter stock name: ")? else {
        return Ok(());
    };
    let Some(quantity) = prompt.ask_parsed::<u64>("Enter quantity to buy: ")? else {
        return Ok(());
    };
    let Some(price) = prompt.ask_parsed::<f64>("Enter price per stock: ")? else {
        return Ok(());
    };

    match client.buy(&symbol, quantity, price) {
        Ok(()) => println!(
            "{}",
            format!("Bought {} shares of {} at ${:.2}", quantity, symbol, price).green()
        ),
        Err(StoreError::Portfolio(e)) => println!("{}", e.to_string().yellow()),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn sell_stock<R: BufRead>(prompt: &mut Prompt<R>, client: &mut Client) -> Result<()> {
    let Some(symbol) = prompt.ask("Enter stock name to sell: ")? else {
        return Ok(());
    };
    let Some(quantity) = prompt.ask_parsed::<u64>("Enter quantity to sell: ")? else {
        return Ok(());
    };
    let Some(price) = prompt.ask_parsed::<f64>("Enter selling price per stock: ")? else {
        return Ok(());
    };

    match client.sell(&symbol, quantity, price) {
        Ok(record) => println!(
            "{}",
            format!(
                "Sold {} shares of {}, realized profit {:.2}",
                record.quantity_sold, record.symbol, record.realized_profit
            )
            .green()
        ),
        Err(StoreError::Portfolio(e)) => println!("{}", e.to_string().yellow()),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn export_portfolio<R: BufRead>(prompt: &mut Prompt<R>, client: &Client) -> Result<()> {
    let Some(file) = prompt.ask("Enter file name to export to: ")? else {
        return Ok(());
    };
    if file.is_empty() {
        println!("{}", "File name must not be empty.".yellow());
        return Ok(());
    }

    match client.export(Path::new(&file)) {
        Ok(()) => println!("{}", format!("Portfolio exported to {}", file).green()),
        Err(e) => println!("{}", format!("Export to {} failed: {}", file, e).red()),
    }
    Ok(())
}
