use serde_json::json;
use serial_test::serial;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use switchyard::cli::{to_exit_code, App};
use switchyard::{
    async_trait, ArgMap, ArgsBuilder, CancellationToken, CommandDescriptor, DispatchError,
    DuplicateScope, HelpCommand, HelpManifest, HelpRenderer, HookError, Hooks, Interceptor,
    InvocationContext, Module, Next, ParamSpec, SetupError,
};

type Log = Arc<Mutex<Vec<String>>>;

#[derive(Default)]
struct UserCommands {
    created: Mutex<Vec<String>>,
}

struct CreateUserArgs;

impl ArgsBuilder for CreateUserArgs {
    fn build(&self, args: &[String]) -> anyhow::Result<ArgMap> {
        let mut map = ArgMap::new();
        map.insert("Name".into(), json!(args.get(1).cloned().unwrap_or_default()));
        Ok(map)
    }
}

struct Middleware {
    log: Log,
}

#[async_trait]
impl Interceptor for Middleware {
    async fn invoke(&self, ctx: &InvocationContext, next: Next<'_>) -> Result<i32, DispatchError> {
        let alias = ctx.alias().unwrap_or_default().to_string();
        self.log.lock().unwrap().push(format!("pre:{alias}"));
        let result = next.run(ctx).await;
        self.log.lock().unwrap().push(format!("post:{alias}"));
        result
    }
}

struct CountingHelp {
    calls: Arc<AtomicUsize>,
    entries: Arc<AtomicUsize>,
}

impl HelpCommand for CountingHelp {
    fn render(&self, manifest: &HelpManifest, _: &CancellationToken) -> anyhow::Result<i32> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entries.store(manifest.len(), Ordering::SeqCst);
        Ok(0)
    }
}

fn users() -> Module {
    Module::new("users")
        .command(
            CommandDescriptor::sync(["createuser", "cu"])
                .description("Creates a user")
                .example("createuser <name>")
                .group("Users")
                .args_builder::<CreateUserArgs>()
                .param(ParamSpec::string("name"))
                .handler(|users: &UserCommands, args| {
                    let name = args.str("name").unwrap_or_default().to_string();
                    users.created.lock().unwrap().push(name);
                    Ok(0)
                }),
        )
        .command(
            CommandDescriptor::sync(["list"])
                .description("Lists users")
                .example("list [limit]")
                .param(ParamSpec::integer("limit").default(10))
                .handler(|_u: &UserCommands, args| Ok(args.i64("limit").unwrap_or(-1) as i32)),
        )
        .command(
            CommandDescriptor::suspending(["import"])
                .description("Imports users")
                .example("import <file>")
                .param(ParamSpec::string("file"))
                .param(ParamSpec::cancellation("cancel"))
                .handler_async(|_u: Arc<UserCommands>, args| async move {
                    if args.cancellation().is_cancelled() {
                        return Ok(2);
                    }
                    tokio::task::yield_now().await;
                    Ok::<_, anyhow::Error>(if args.str("file") == Some("users.csv") { 0 } else { 1 })
                }),
        )
}

fn reports() -> Module {
    Module::new("reports").command(
        CommandDescriptor::sync(["report"])
            .description("Prints a report")
            .example("report")
            .group("Reports")
            .handler(|_u: &UserCommands, _| Ok(0)),
    )
}

fn app(args: &[&str]) -> App {
    App::builder()
        .args(args.iter().copied())
        .use_default_help()
        .optimized_initialization(true)
        .service(UserCommands::default())
        .service(CreateUserArgs)
        .module(users())
        .module(reports())
        .build()
        .unwrap()
}

#[test]
#[serial]
fn test_custom_args_builder_binds_name() {
    let store = Arc::new(UserCommands::default());
    let app = App::builder()
        .args(["createuser", "John"])
        .optimized_initialization(true)
        .service_arc(store.clone())
        .service(CreateUserArgs)
        .module(users())
        .build()
        .unwrap();

    assert_eq!(app.run_blocking().unwrap(), 0);
    assert_eq!(*store.created.lock().unwrap(), vec!["John"]);
}

#[test]
#[serial]
fn test_alias_is_case_insensitive() {
    assert_eq!(app(&["CU", "Ada"]).run_blocking().unwrap(), 0);
}

#[test]
#[serial]
fn test_default_parameter() {
    assert_eq!(app(&["list"]).run_blocking().unwrap(), 10);
}

#[test]
#[serial]
fn test_unknown_command_fails() {
    let err = app(&["frobnicate"]).run_blocking().unwrap_err();
    assert!(matches!(err, DispatchError::CommandNotFound { .. }));
    assert_eq!(err.to_string(), "command 'frobnicate' not found");
}

#[test]
#[serial]
fn test_current_is_cleared_after_run() {
    let first = app(&["list"]);
    assert!(!first.is_current());
    first.run_blocking().unwrap();
    assert_eq!(App::current(), None);

    let _ = app(&["nope"]).run_blocking();
    assert_eq!(App::current(), None);
}

#[test]
#[serial]
fn test_middleware_runs_around_handler() {
    let log = Log::default();
    let app = App::builder()
        .args(["list"])
        .optimized_initialization(true)
        .service(UserCommands::default())
        .module(users())
        .interceptor(Middleware { log: log.clone() })
        .hooks(Hooks::new().after(|_, code| Ok(code - 10)))
        .build()
        .unwrap();

    assert_eq!(app.run_blocking().unwrap(), 0);
    assert_eq!(*log.lock().unwrap(), vec!["pre:list", "post:list"]);
}

#[test]
#[serial]
fn test_hook_can_block_command() {
    let app = App::builder()
        .args(["list"])
        .optimized_initialization(true)
        .service(UserCommands::default())
        .module(users())
        .hooks(
            Hooks::new()
                .only(["list"])
                .before(|_| Err(HookError::before("listing disabled"))),
        )
        .build()
        .unwrap();

    let err = app.run_blocking().unwrap_err();
    assert!(matches!(err, DispatchError::Hook(_)));
}

#[tokio::test]
#[serial]
async fn test_async_handler() {
    let code = app(&["import", "users.csv"])
        .run(CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(code, 0);
}

#[tokio::test]
#[serial]
async fn test_async_handler_sees_cancellation() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let code = app(&["import", "users.csv"]).run(cancel).await.unwrap();
    assert_eq!(code, 2);
}

#[tokio::test]
#[serial]
async fn test_run_command_ignores_configured_args() {
    let app = App::builder()
        .use_default_help()
        .service(UserCommands::default())
        .service(CreateUserArgs)
        .module(users())
        .build()
        .unwrap();

    let code = app
        .run_command("list", Vec::<String>::new(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(code, 10);
}

#[test]
#[serial]
fn test_help_on_empty_args() {
    let calls = Arc::new(AtomicUsize::new(0));
    let entries = Arc::new(AtomicUsize::new(0));
    let app = App::builder()
        .empty_args_means_help(true)
        .help_renderer(HelpRenderer::sync(CountingHelp {
            calls: calls.clone(),
            entries: entries.clone(),
        }))
        .module(users())
        .module(reports())
        .build()
        .unwrap();

    assert_eq!(app.run_blocking().unwrap(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(entries.load(Ordering::SeqCst), 4);
}

#[test]
#[serial]
fn test_help_trigger_with_default_help() {
    for trigger in ["-h", "--help", "/?", "HELP"] {
        assert_eq!(app(&[trigger]).run_blocking().unwrap(), 0, "{trigger}");
    }
}

#[test]
#[serial]
fn test_custom_help_triggers() {
    let app = App::builder()
        .args(["?"])
        .help_triggers(["?"])
        .use_default_help()
        .module(users())
        .build()
        .unwrap();
    assert_eq!(app.run_blocking().unwrap(), 0);
}

#[test]
#[serial]
fn test_empty_args_without_help_is_an_error() {
    let err = App::builder()
        .use_default_help()
        .module(users())
        .build()
        .unwrap()
        .run_blocking()
        .unwrap_err();
    assert!(matches!(err, DispatchError::MissingCommand));
}

#[test]
fn test_full_mode_without_help_fails_to_build() {
    let err = App::builder().args(["list"]).module(users()).build().unwrap_err();
    assert!(matches!(
        err.as_dispatch(),
        Some(DispatchError::HelpNotConfigured)
    ));
}

#[test]
fn test_duplicate_across_modules_fails_to_build() {
    let clash = Module::new("clash")
        .command(CommandDescriptor::sync(["LIST"]).handler(|_u: &UserCommands, _| Ok(0)));

    let err = App::builder()
        .args(["list"])
        .use_default_help()
        .module(users())
        .module(clash)
        .build()
        .unwrap_err();
    assert_eq!(err.to_string(), "multiple commands found for 'LIST'");
}

#[test]
#[serial]
fn test_optimized_per_module_scope_first_wins() {
    let shadow = Module::new("shadow")
        .command(CommandDescriptor::sync(["list"]).handler(|_u: &UserCommands, _| Ok(99)));

    let app = App::builder()
        .args(["list"])
        .optimized_initialization(true)
        .duplicate_scope(DuplicateScope::PerProvider)
        .service(UserCommands::default())
        .module(users())
        .module(shadow)
        .build()
        .unwrap();
    assert_eq!(app.run_blocking().unwrap(), 10);
}

#[test]
fn test_no_commands_defined_names_alias() {
    let err = App::builder()
        .args(["deploy"])
        .optimized_initialization(true)
        .module(Module::new("empty"))
        .build()
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "no commands defined for 'deploy' in the registered modules"
    );
}

#[test]
fn test_invalid_help_template() {
    let err = App::builder()
        .args(["list"])
        .use_default_help()
        .help_template("{% if %}")
        .module(users())
        .build()
        .unwrap_err();
    assert!(matches!(err, SetupError::Template(_)));
}

#[test]
fn test_exit_code_mapping() {
    assert_eq!(to_exit_code(Ok(0)), ExitCode::SUCCESS);
    assert_eq!(to_exit_code(Ok(3)), ExitCode::from(3));
    assert_eq!(to_exit_code(Ok(-1)), ExitCode::from(1));
    assert_eq!(
        to_exit_code(Err(DispatchError::MissingCommand)),
        ExitCode::FAILURE
    );
}

#[test]
#[serial]
fn test_module_interceptors_wrap_commands() {
    let log = Log::default();
    let audit = Module::new("audit")
        .interceptor(Middleware { log: log.clone() })
        .command(CommandDescriptor::sync(["audit"]).handler(|_u: &UserCommands, _| Ok(7)));

    let app = App::builder()
        .args(["list"])
        .use_default_help()
        .service(UserCommands::default())
        .module(users())
        .module_interceptors(audit)
        .build()
        .unwrap();

    assert_eq!(app.run_blocking().unwrap(), 10);
    assert_eq!(*log.lock().unwrap(), vec!["pre:list", "post:list"]);
    assert!(!app.engine().table().contains("audit"));
}

#[test]
#[serial]
fn test_help_only_module() {
    let calls = Arc::new(AtomicUsize::new(0));
    let entries = Arc::new(AtomicUsize::new(0));
    let docs = Module::new("docs")
        .help(HelpRenderer::sync(CountingHelp {
            calls: calls.clone(),
            entries: entries.clone(),
        }))
        .command(CommandDescriptor::sync(["secret"]).handler(|_u: &UserCommands, _| Ok(0)));

    let app = App::builder()
        .args(["--help"])
        .module_commands(users())
        .module_help(docs)
        .build()
        .unwrap();

    assert_eq!(app.run_blocking().unwrap(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(entries.load(Ordering::SeqCst), 3);
    assert!(!app.engine().table().contains("secret"));
}
