//! # Cashier Console
//!
//! A line-oriented front end over [`PosSession`]. One command per line; every
//! failure is printed as `[CODE] message` and the loop carries on.
//!
//! ## Commands
//! ```text
//! search <text>         stock at the current branch (numbered options)
//! add <n>               add option n to the cart (again = +1)
//! qty <stock> <n>       set a line's quantity (0 removes)
//! disc <stock> <pct>    set a line's discount (needs the grant)
//! rm <stock>            remove a line
//! customers <text>      customer search (numbered options)
//! pick <n>              select customer option n
//! walkin                clear the customer
//! face <image-file>     identify the customer from a captured still
//! pay cash|card|upi     payment method
//! branch <id> [name]    switch branch
//! cart                  show the cart
//! history               selected customer's recent purchases
//! submit                record the sale
//! print                 print the invoice and start a new cart
//! done                  invoice handled without printing; start a new cart
//! help                  this list
//! quit                  leave
//! ```

use chrono::Local;
use std::fmt::Write as _;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use rxpos_core::history::SaleSummary;
use rxpos_core::invoice::Invoice;
use rxpos_core::pricing::resolve_stock;
use rxpos_core::types::{Branch, Customer, EntityId, PaymentMethod, StockRow};
use rxpos_core::validation::{parse_choice, parse_discount, parse_entity_id, parse_quantity};
use rxpos_core::Cart;

use crate::error::PosError;
use crate::printer::InvoicePrinter;
use crate::session::PosSession;

pub const HELP: &str = "\
search <text>       qty <stock> <n>     customers <text>    pay cash|card|upi
add <n>             disc <stock> <pct>  pick <n>            branch <id> [name]
cart                rm <stock>          walkin              face <image-file>
history             submit              print               done
help                quit";

// =============================================================================
// Command Parsing
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Search(String),
    Add(String),
    Quantity { stock: String, quantity: String },
    Discount { stock: String, percent: String },
    Remove(String),
    Customers(String),
    Pick(String),
    WalkIn,
    Face(String),
    Pay(String),
    Branch { id: String, name: Option<String> },
    Cart,
    History,
    Submit,
    Print,
    /// Acknowledge the frozen sale without printing.
    Done,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = PosError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = match line.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (line, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        let needs = |n: usize, usage: &str| -> Result<(), PosError> {
            if args.len() < n {
                Err(PosError::validation(format!("usage: {}", usage)))
            } else {
                Ok(())
            }
        };

        let command = match verb.to_lowercase().as_str() {
            "search" | "s" => Command::Search(rest.to_string()),
            "add" | "a" => {
                needs(1, "add <n>")?;
                Command::Add(args[0].to_string())
            }
            "qty" => {
                needs(2, "qty <stock> <n>")?;
                Command::Quantity {
                    stock: args[0].to_string(),
                    quantity: args[1].to_string(),
                }
            }
            "disc" => {
                needs(2, "disc <stock> <pct>")?;
                Command::Discount {
                    stock: args[0].to_string(),
                    percent: args[1].to_string(),
                }
            }
            "rm" => {
                needs(1, "rm <stock>")?;
                Command::Remove(args[0].to_string())
            }
            "customers" | "c" => Command::Customers(rest.to_string()),
            "pick" => {
                needs(1, "pick <n>")?;
                Command::Pick(args[0].to_string())
            }
            "walkin" => Command::WalkIn,
            "face" => {
                needs(1, "face <image-file>")?;
                Command::Face(rest.to_string())
            }
            "pay" => {
                needs(1, "pay cash|card|upi")?;
                Command::Pay(args[0].to_string())
            }
            "branch" => {
                needs(1, "branch <id> [name]")?;
                let name = rest[args[0].len()..].trim();
                Command::Branch {
                    id: args[0].to_string(),
                    name: (!name.is_empty()).then(|| name.to_string()),
                }
            }
            "cart" => Command::Cart,
            "history" => Command::History,
            "submit" => Command::Submit,
            "print" => Command::Print,
            "done" | "ack" => Command::Done,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => {
                return Err(PosError::validation(format!(
                    "unknown command '{}' (type help)",
                    other
                )))
            }
        };
        Ok(command)
    }
}

// =============================================================================
// Execution
// =============================================================================

/// What a command produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    /// A newer command overtook a lookup; nothing to show.
    Nothing,
    Quit,
}

/// Runs one command against the session.
pub async fn execute(
    session: &PosSession,
    printer: &dyn InvoicePrinter,
    command: Command,
) -> Result<Reply, PosError> {
    debug!(?command, "console command");
    let currency = session.config().receipt.currency_symbol.clone();

    let text = match command {
        Command::Search(query) => match session.search_stock(&query).await? {
            Some(rows) => render_stock_options(&rows, session, &currency),
            None => return Ok(Reply::Nothing),
        },
        Command::Add(n) => {
            let index = parse_choice(&n, session.stock_options().len())?;
            let line = session.add_option(index)?;
            format!(
                "{} [{}] x{} (of {})\n{}",
                line.product_name,
                line.stock_id,
                line.quantity,
                line.quantity_available,
                render_totals_line(&session.cart(), &currency)
            )
        }
        Command::Quantity { stock, quantity } => {
            let stock_id = parse_entity_id("stock", &stock)?;
            session.set_quantity(&stock_id, parse_quantity(&quantity)?)?;
            render_cart(&session.cart(), &currency)
        }
        Command::Discount { stock, percent } => {
            let stock_id = parse_entity_id("stock", &stock)?;
            let stored = session.set_discount(&stock_id, parse_discount(&percent))?;
            format!(
                "Discount on {} set to {}%\n{}",
                stock_id,
                stored,
                render_totals_line(&session.cart(), &currency)
            )
        }
        Command::Remove(stock) => {
            let stock_id = parse_entity_id("stock", &stock)?;
            session.remove_line(&stock_id)?;
            render_cart(&session.cart(), &currency)
        }
        Command::Customers(query) => match session.search_customers(&query).await? {
            Some(customers) => render_customer_options(&customers),
            None => return Ok(Reply::Nothing),
        },
        Command::Pick(n) => {
            let index = parse_choice(&n, session.customer_options().len())?;
            let customer = session.pick_customer(index)?;
            format!("Customer: {}", customer.display_name())
        }
        Command::WalkIn => {
            session.walk_in()?;
            "Customer: walk-in".to_string()
        }
        Command::Face(path) => {
            let image = tokio::fs::read(&path)
                .await
                .map_err(|e| PosError::validation(format!("cannot read {}: {}", path, e)))?;
            let outcome = session.identify_face(&image).await?;
            match session.cart().customer() {
                Some(customer) if outcome.is_match() => {
                    format!("Face matched: {}", customer.display_name())
                }
                _ => "No face match; search customers manually".to_string(),
            }
        }
        Command::Pay(method) => {
            let method = PaymentMethod::from_str(&method)?;
            session.set_payment(method)?;
            format!("Payment: {}", method.to_string().to_uppercase())
        }
        Command::Branch { id, name } => {
            let branch = Branch {
                id: parse_entity_id("branch", &id)?,
                name,
                tenant_id: session.config().store.tenant_id.clone(),
            };
            let label = branch.display_name();
            session.switch_branch(branch);
            format!("Branch: {}", label)
        }
        Command::Cart => render_cart(&session.cart(), &currency),
        Command::History => {
            let rows = session.customer_history(Local::now().date_naive()).await?;
            render_history(&rows, &currency)
        }
        Command::Submit => {
            let invoice = session.complete_sale().await?;
            render_submitted(&invoice, &currency)
        }
        Command::Print => {
            let sale = session.print_invoice(printer).await?;
            format!(
                "Printed {}. New cart ready.",
                sale.invoice_number.as_deref().unwrap_or("invoice")
            )
        }
        Command::Done => {
            let sale = session.acknowledge_printed()?;
            format!(
                "Closed {}. New cart ready.",
                sale.invoice_number.as_deref().unwrap_or("sale")
            )
        }
        Command::Help => HELP.to_string(),
        Command::Quit => return Ok(Reply::Quit),
    };
    Ok(Reply::Text(text))
}

/// Reads commands from `input` until `quit` or end of input.
pub async fn run<R, W>(
    session: &PosSession,
    printer: &dyn InvoicePrinter,
    input: R,
    mut output: W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    write_prompt(&mut output, session).await?;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            write_prompt(&mut output, session).await?;
            continue;
        }

        let reply = match line.parse::<Command>() {
            Ok(command) => execute(session, printer, command).await,
            Err(e) => Err(e),
        };

        match reply {
            Ok(Reply::Quit) => break,
            Ok(Reply::Nothing) => {}
            Ok(Reply::Text(text)) => {
                output.write_all(text.as_bytes()).await?;
                output.write_all(b"\n").await?;
            }
            Err(e) => {
                output.write_all(format!("{}\n", e).as_bytes()).await?;
            }
        }
        write_prompt(&mut output, session).await?;
    }

    output.flush().await
}

async fn write_prompt<W: AsyncWrite + Unpin>(output: &mut W, session: &PosSession) -> std::io::Result<()> {
    let branch = session
        .branch()
        .map(|b| b.display_name())
        .unwrap_or_else(|| "no branch".to_string());
    let phase = session.cart().phase();
    output
        .write_all(format!("rxpos [{} | {}]> ", branch, phase).as_bytes())
        .await?;
    output.flush().await
}

// =============================================================================
// Rendering
// =============================================================================

fn render_stock_options(rows: &[StockRow], session: &PosSession, currency: &str) -> String {
    if rows.is_empty() {
        return "No stock found".to_string();
    }
    let default_gst = session.config().store.default_gst();
    let mut out = String::new();
    for (i, row) in rows.iter().enumerate() {
        match resolve_stock(row, default_gst) {
            Ok(stock) => {
                let _ = writeln!(
                    out,
                    "{:>2}. {} | batch {} | exp {} | {}{} (MRP {}{}) | GST {}% | avl {}",
                    i + 1,
                    stock.product_name,
                    stock.batch_number,
                    stock.expiry_date.as_deref().unwrap_or("-"),
                    currency,
                    stock.unit_price,
                    currency,
                    stock.mrp,
                    stock.gst,
                    stock.quantity_available
                );
            }
            Err(e) => {
                let _ = writeln!(out, "{:>2}. (unusable row: {})", i + 1, e);
            }
        }
    }
    out.trim_end().to_string()
}

fn render_customer_options(customers: &[Customer]) -> String {
    if customers.is_empty() {
        return "No customers found".to_string();
    }
    customers
        .iter()
        .enumerate()
        .map(|(i, c)| {
            format!(
                "{:>2}. {} | {}",
                i + 1,
                c.display_name(),
                c.phone.as_deref().unwrap_or("-")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_totals_line(cart: &Cart, currency: &str) -> String {
    let totals = cart.totals();
    format!(
        "{} line(s), {} item(s), total {}{}",
        totals.line_count, totals.total_quantity, currency, totals.final_amount
    )
}

/// The cart as the cashier sees it, with stock ids for `qty`/`disc`/`rm`.
pub fn render_cart(cart: &Cart, currency: &str) -> String {
    let mut out = String::new();
    let customer = cart
        .customer()
        .map(|c| c.display_name())
        .unwrap_or_else(|| "walk-in".to_string());
    let _ = writeln!(
        out,
        "Cart ({}) | customer: {} | pay: {}",
        cart.phase(),
        customer,
        cart.payment_method().to_string().to_uppercase()
    );

    if cart.is_empty() {
        out.push_str("  (empty)");
        return out;
    }

    for line in cart.lines() {
        let _ = writeln!(
            out,
            "  [{}] {} ({}) {} x {}{} -{}% = {}{}  GST {}%",
            line.stock_id,
            line.product_name,
            line.batch_number,
            line.quantity,
            currency,
            line.unit_price,
            line.discount,
            currency,
            line.line_total(),
            line.gst
        );
    }

    let totals = cart.totals();
    let _ = writeln!(out, "  Gross    {}{}", currency, totals.gross_amount);
    let _ = writeln!(out, "  Discount {}{}", currency, totals.discount_amount);
    let _ = write!(out, "  Total    {}{}", currency, totals.final_amount);
    out
}

fn render_history(rows: &[SaleSummary], currency: &str) -> String {
    if rows.is_empty() {
        return "No purchases in this period".to_string();
    }
    rows.iter()
        .map(|r| {
            format!(
                "{} | {} | {}{}",
                r.sale_date.as_deref().unwrap_or("-"),
                r.invoice_number
                    .clone()
                    .or_else(|| r.id.as_ref().map(EntityId::to_string))
                    .unwrap_or_else(|| "-".to_string()),
                currency,
                r.final_amount
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_submitted(invoice: &Invoice, currency: &str) -> String {
    format!(
        "Sale recorded: invoice {} | total {}{}\nType 'print' to print the invoice and start a new cart.",
        invoice.reference(),
        currency,
        invoice.totals.final_amount
    )
}
