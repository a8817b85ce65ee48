//! Application surface: [`App`], [`AppBuilder`] and the default help.
//!
//! An application is a set of independently registered modules, each
//! declaring commands. The builder collects them together with the services
//! that back their handlers, and builds the routing table once. Running the
//! App dispatches one argument vector and yields an exit code.
//!
//! ## Execution Flow
//!
//! ```text
//! args → help policy → routing table → argument builder → binder → interceptors → handler
//! ```
//!
//! 1. Help policy: empty arguments (if configured) or a help trigger in first
//!    position selects the help path, which skips binding.
//!
//! 2. Routing: the first argument is looked up case-insensitively. With
//!    optimized initialization the table only holds that one command.
//!
//! 3. Arguments: the remaining arguments are mapped positionally onto the
//!    handler's parameters, or by the command's own argument builder.
//!
//! 4. Binding: defaults, optional and nullable parameters, strict kind checks.
//!
//! 5. Interceptors: registered stages run outermost first around the handler
//!    or help renderer.
//!
//! ## Quick Start
//!
//! ```rust
//! use switchyard::cli::App;
//! use switchyard::{CommandDescriptor, Module, ParamSpec};
//!
//! struct Greeter;
//!
//! let greetings = Module::new("greetings").command(
//!     CommandDescriptor::sync(["greet", "hi"])
//!         .description("Greets someone")
//!         .example("greet <name>")
//!         .param(ParamSpec::string("name").default("World"))
//!         .handler(|_g: &Greeter, args| {
//!             println!("Hello, {}!", args.str("name").unwrap_or_default());
//!             Ok(0)
//!         }),
//! );
//!
//! let app = App::builder()
//!     .args(["hi", "Ada"])
//!     .use_default_help()
//!     .service(Greeter)
//!     .module(greetings)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(app.run_blocking().unwrap(), 0);
//! ```
//!
//! ## Key Types
//!
//! - [`App`] / [`AppBuilder`]: Main entry point and configuration
//! - [`DefaultHelp`](help::DefaultHelp): the stock help renderer
//! - [`to_exit_code`]: maps a run outcome to a process exit code

mod app;
mod builder;
pub mod help;

pub use app::{to_exit_code, App};
pub use builder::AppBuilder;
pub use help::{render_help_text, DefaultHelp};
