//! Route table inspection.

use payment_voucher_console::routes::RouteTarget;
use payment_voucher_console::{Access, Navigation, RouteTable};

use super::{CliError, restore};

/// Print what navigating to `path` does for the current session.
#[allow(clippy::print_stdout)]
pub async fn open(path: &str) -> Result<(), CliError> {
    let session = restore().await?;
    let state = session.snapshot();

    match RouteTable::standard().navigate(&state, path) {
        Navigation::Render { view, params } => {
            println!("Render: {}", view.title());
            for (name, value) in params {
                println!("  {name} = {value}");
            }
        }
        Navigation::Wait => println!("Waiting for session"),
        Navigation::Redirect(redirect) => println!("Redirect: {}", redirect.href()),
        Navigation::NotFound => println!("Not found: {path}"),
    }
    Ok(())
}

/// Print every registered route.
#[allow(clippy::print_stdout)]
pub fn routes() {
    for route in RouteTable::standard().routes() {
        let description = match route.target() {
            RouteTarget::View { view, access } => {
                let access = match access {
                    Access::Public => "public".to_string(),
                    Access::Protected(constraint) => constraint
                        .required_role
                        .map_or_else(|| "authenticated".to_string(), |role| role.to_string()),
                };
                format!("{:<24} {access}", view.title())
            }
            RouteTarget::Redirect(to) => format!("-> {to}"),
        };
        println!("{:<28} {description}", route.pattern());
    }
}
