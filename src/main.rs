use std::{env, path::PathBuf};

use vellum::{
    ComponentCompiler, ComponentDefinition, CompilerConfiguration, ComponentInstance,
    diagnostics::{DEFAULT_MAX_ERRORS, DiagnosticsAggregator},
    runtime::json::{json_to_value, scene_to_json, value_from_json, value_to_json},
};

#[derive(Debug, Default)]
struct Options {
    file: Option<String>,
    style: Option<String>,
    include_paths: Vec<PathBuf>,
    sets: Vec<(String, String)>,
    invokes: Vec<(String, String)>,
    scene: bool,
    scene_json: bool,
    event_loop: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        print_help();
        return;
    };
    if matches!(command.as_str(), "-h" | "--help" | "help") {
        print_help();
        return;
    }
    if !matches!(command.as_str(), "check" | "inspect" | "run") {
        eprintln!("Error: unknown command `{}`", command);
        print_help();
        std::process::exit(2);
    }

    let options = match parse_options(&args[1..]) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("Error: {}", message);
            eprintln!("Usage: vellum {} <file.vel> [flags]", command);
            std::process::exit(2);
        }
    };
    let Some(file) = options.file.clone() else {
        eprintln!("Usage: vellum {} <file.vel> [flags]", command);
        std::process::exit(2);
    };

    let definition = compile(&file, &options);
    match command.as_str() {
        "check" => println!("{}: ok ({})", file, definition.name()),
        "inspect" => match serde_json::to_value(definition.summary()) {
            Ok(json) => print_json(&json),
            Err(err) => {
                eprintln!("Error: {}", err);
                std::process::exit(1);
            }
        },
        _ => run(&definition, &options),
    }
}

fn print_help() {
    println!(
        "\
Vellum CLI

Usage:
  vellum check <file.vel>
  vellum inspect <file.vel>
  vellum run <file.vel> [--set name=JSON]... [--invoke name=JSON-ARRAY]...

Flags:
  --style <name>         Widget style (default: $VELLUM_STYLE or fluent)
  -I <dir>               Add an import search path (can be repeated)
  --set name=JSON        Assign a public property before printing (run)
  --invoke name=ARGS     Invoke a callback with a JSON array of arguments (run)
  --scene                Print the evaluated element tree (run)
  --scene-json           Print the evaluated element tree as JSON (run)
  --event-loop           Show the window and run the event loop (run)
  -h, --help             Show this help message

Logging is controlled with RUST_LOG.
"
    );
}

fn parse_options(args: &[String]) -> Result<Options, String> {
    let mut options = Options::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--style" => {
                let style = iter.next().ok_or("--style requires a value")?;
                options.style = Some(style.clone());
            }
            "-I" | "--include" => {
                let dir = iter.next().ok_or("-I requires a directory")?;
                options.include_paths.push(PathBuf::from(dir));
            }
            "--set" => {
                let assignment = iter.next().ok_or("--set requires name=JSON")?;
                options.sets.push(split_assignment(assignment)?);
            }
            "--invoke" => {
                let call = iter.next().ok_or("--invoke requires name=JSON-ARRAY")?;
                options.invokes.push(split_assignment(call)?);
            }
            "--scene" => options.scene = true,
            "--scene-json" => options.scene_json = true,
            "--event-loop" => options.event_loop = true,
            flag if flag.starts_with('-') => return Err(format!("unknown flag `{}`", flag)),
            file => {
                if options.file.is_some() {
                    return Err(format!("unexpected argument `{}`", file));
                }
                options.file = Some(file.to_string());
            }
        }
    }
    Ok(options)
}

fn split_assignment(text: &str) -> Result<(String, String), String> {
    text.split_once('=')
        .map(|(name, json)| (name.trim().to_string(), json.to_string()))
        .ok_or_else(|| format!("expected name=JSON, got `{}`", text))
}

/// Compile `file`, printing diagnostics. Exits on errors.
fn compile(file: &str, options: &Options) -> ComponentDefinition {
    let mut config = CompilerConfiguration::from_env();
    if let Some(style) = &options.style {
        config.style = style.clone();
    }
    config.include_paths.extend(options.include_paths.iter().cloned());
    let mut compiler = ComponentCompiler::with_configuration(config);
    let definition = compiler.build_from_path(file);

    let diagnostics = compiler.diagnostics();
    if !diagnostics.is_empty() {
        let report = DiagnosticsAggregator::new(diagnostics)
            .with_max_errors(Some(DEFAULT_MAX_ERRORS))
            .report();
        eprintln!("{}", report.rendered);
    }
    match definition {
        Some(definition) => definition,
        None => std::process::exit(1),
    }
}

fn run(definition: &ComponentDefinition, options: &Options) {
    let instance = definition.create();

    for (name, json) in &options.sets {
        if let Err(message) = assign(definition, &instance, name, json) {
            eprintln!("Error: --set {}: {}", name, message);
            std::process::exit(1);
        }
    }

    for (name, json) in &options.invokes {
        let args = match serde_json::from_str::<serde_json::Value>(json) {
            Ok(serde_json::Value::Array(items)) => items.iter().map(value_from_json).collect::<Vec<_>>(),
            Ok(_) => {
                eprintln!("Error: --invoke {}: arguments must be a JSON array", name);
                std::process::exit(1);
            }
            Err(err) => {
                eprintln!("Error: --invoke {}: {}", name, err);
                std::process::exit(1);
            }
        };
        match instance.try_invoke_callback(name, &args) {
            Ok(result) => println!("{} -> {}", name, value_to_json(&result)),
            Err(err) => {
                eprintln!("Error: {}", err);
                std::process::exit(1);
            }
        }
    }

    let properties: serde_json::Map<String, serde_json::Value> = definition
        .properties()
        .into_iter()
        .filter_map(|property| {
            let value = instance.get_property(&property.name)?;
            Some((property.name, value_to_json(&value)))
        })
        .collect();
    print_json(&serde_json::Value::Object(properties));

    if options.scene {
        print!("{}", instance.render_scene());
    }
    if options.scene_json {
        print_json(&scene_to_json(&instance.render_scene()));
    }
    if options.event_loop {
        if let Err(err) = instance.run() {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    }
}

fn assign(
    definition: &ComponentDefinition,
    instance: &ComponentInstance,
    name: &str,
    json: &str,
) -> Result<(), String> {
    let ty = definition
        .property_type(name)
        .ok_or_else(|| format!("no public property named `{}`", name))?;
    let json: serde_json::Value = serde_json::from_str(json).map_err(|err| err.to_string())?;
    let value = json_to_value(&json, &ty).map_err(|err| err.to_string())?;
    instance.try_set_property(name, value).map_err(|err| err.to_string())
}

fn print_json(json: &serde_json::Value) {
    match serde_json::to_string_pretty(json) {
        Ok(text) => println!("{}", text),
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
    }
}
