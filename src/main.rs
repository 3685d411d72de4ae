//! Nexus REPL - interactive unification over the symbol table.

use nexus::syntax::TermReader;
use nexus::unify::{BindingOrder, Environment, TrailMark, Unifier, UnifyConfig};
use nexus::{NexusError, Result, SymbolId, SymbolTable};
use rustc_hash::FxHashMap;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::env;
use std::fs;
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// What the REPL should do after a line.
enum Flow {
    Continue,
    Quit,
}

/// Everything a REPL session accumulates.
struct Session {
    table: SymbolTable,
    env: Environment,
    config: UnifyConfig,
    marks: Vec<TrailMark>,
    /// Variable scope shared by every line of the session
    vars: FxHashMap<String, SymbolId>,
}

impl Session {
    fn new() -> Self {
        Self {
            table: SymbolTable::new(),
            env: Environment::new(),
            config: UnifyConfig::default(),
            marks: Vec::new(),
            vars: FxHashMap::default(),
        }
    }

    fn handle_line(&mut self, line: &str) -> Result<Flow> {
        if line.starts_with(':') {
            return Ok(self.handle_command(line));
        }
        self.solve(line)?;
        Ok(Flow::Continue)
    }

    /// Unify `t1 = t2` in the session environment.
    fn solve(&mut self, input: &str) -> Result<()> {
        let vars = std::mem::take(&mut self.vars);
        let mut reader = TermReader::with_variables(&mut self.table, vars);
        let equation = reader.read_equation(input);
        self.vars = reader.into_variables();
        let (left, right) = equation?;

        let unifier = Unifier::new(&self.table, self.config.clone());
        match unifier.try_unify(left, right, &mut self.env) {
            Ok(true) => {
                println!("yes");
                let mut names: Vec<_> = self.vars.iter().collect();
                names.sort();
                for (name, &var) in names {
                    match unifier.resolve(var, &self.env) {
                        Ok(term) => {
                            let shown = term.to_string();
                            if shown != *name {
                                println!("  {} = {}", name, shown);
                            }
                        }
                        Err(e) => println!("  {} = <{}>", name, e),
                    }
                }
            }
            Ok(false) => println!("no"),
            Err(e) => println!("error: {}", e),
        }
        Ok(())
    }

    fn handle_command(&mut self, cmd: &str) -> Flow {
        let parts: Vec<&str> = cmd.split_whitespace().collect();
        let command = parts.first().copied().unwrap_or(":help");

        match command {
            ":quit" | ":q" | ":exit" => {
                println!("Bye!");
                return Flow::Quit;
            }

            ":help" | ":h" | ":?" => print_help(),

            ":mark" | ":m" => {
                let mark = self.env.mark();
                self.marks.push(mark);
                println!("mark {} set at trail length {}", self.marks.len(), self.env.trail_len());
            }

            ":undo" | ":u" => match self.marks.pop() {
                Some(mark) => {
                    self.env.backtrack_to(mark);
                    println!("back to trail length {}", self.env.trail_len());
                }
                None => println!("no mark set"),
            },

            ":backtrack" | ":b" => {
                self.env.backtrack();
                self.marks.clear();
                println!("environment cleared");
            }

            ":commit" | ":c" => match self.env.apply_bindings_to_symbols(&mut self.table) {
                Ok(n) => println!("committed {} binding(s)", n),
                Err(e) => println!("error: {}", e),
            },

            ":env" | ":e" => {
                let bindings = self.env.bindings();
                if bindings.is_empty() {
                    println!("no bindings");
                }
                for (var, value) in bindings {
                    println!("  {} -> {}", self.name_of(var), self.name_of(value));
                }
            }

            ":show" | ":s" => {
                if parts.len() < 2 {
                    println!("Usage: :show <name>");
                } else {
                    self.show(parts[1]);
                }
            }

            ":symbols" | ":sym" => {
                for sym in self.table.iter() {
                    println!("{}", self.table.info(sym.id));
                }
            }

            ":set" => {
                if parts.len() < 3 {
                    println!("Usage: :set <occurs|transactional|strict|order|steps|depth> <value>");
                } else if let Err(e) = self.set(parts[1], parts[2]) {
                    println!("{}", e);
                }
            }

            _ => println!("Unknown command: {}. Type :help for commands.", command),
        }

        Flow::Continue
    }

    fn show(&self, name: &str) {
        let id = self
            .vars
            .get(name)
            .copied()
            .or_else(|| self.table.lookup_by_name(name));
        let Some(id) = id else {
            println!("unknown symbol: {}", name);
            return;
        };

        println!("{}", self.table.info(id));
        let unifier = Unifier::new(&self.table, self.config.clone());
        match unifier.resolve(id, &self.env) {
            Ok(term) => println!("  = {}", term),
            Err(e) => println!("  error: {}", e),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), String> {
        match key {
            "occurs" => self.config.occurs_check = parse_switch(value)?,
            "transactional" => self.config.transactional = parse_switch(value)?,
            "strict" => self.config.strict_constants = parse_switch(value)?,
            "order" => {
                self.config.binding_order = match value {
                    "arg" | "argument" => BindingOrder::ArgumentOrder,
                    "young" | "younger" => BindingOrder::YoungerToOlder,
                    _ => return Err(format!("order must be arg or young, got {}", value)),
                }
            }
            "steps" => self.config.max_steps = parse_limit(value)?,
            "depth" => self.config.max_depth = parse_limit(value)?,
            _ => return Err(format!("unknown setting: {}", key)),
        }
        println!("{} = {}", key, value);
        Ok(())
    }

    fn name_of(&self, id: SymbolId) -> String {
        match self.table.get(id) {
            Some(sym) => sym.display_name(),
            None => id.to_string(),
        }
    }
}

fn parse_switch(value: &str) -> std::result::Result<bool, String> {
    match value {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => Err(format!("expected on or off, got {}", value)),
    }
}

fn parse_limit(value: &str) -> std::result::Result<Option<usize>, String> {
    if value == "off" {
        return Ok(None);
    }
    value
        .parse::<usize>()
        .map(Some)
        .map_err(|_| format!("expected a number or off, got {}", value))
}

fn main() -> Result<()> {
    // RUST_LOG=nexus=trace shows every deref/bind/unify step
    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).without_time().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = env::args().collect();
    let mut session = Session::new();

    if args.len() > 1 {
        let file_path = &args[1];
        match run_file(file_path, &mut session) {
            Ok(Flow::Quit) => return Ok(()),
            Ok(Flow::Continue) => {}
            Err(e) => {
                eprintln!("Error loading {}: {}", file_path, e);
                std::process::exit(1);
            }
        }

        if args.len() > 2 && args[2] == "--repl" {
            return run_repl(session);
        }
        return Ok(());
    }

    println!("Nexus v{} - unification REPL", env!("CARGO_PKG_VERSION"));
    println!("Type :help for commands, :quit to exit\n");

    run_repl(session)
}

fn run_repl(mut session: Session) -> Result<()> {
    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Failed to create editor: {}", e);
            std::process::exit(1);
        }
    };

    loop {
        match rl.readline("nexus> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                match session.handle_line(trimmed) {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Quit) => break,
                    Err(e) => println!("error: {}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Bye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

/// Run every line of a script. Blank lines and `%` comments are skipped.
fn run_file(path: &str, session: &mut Session) -> Result<Flow> {
    let contents = fs::read_to_string(Path::new(path))?;

    for (line_num, line) in contents.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('%') {
            continue;
        }
        println!("nexus> {}", trimmed);
        let flow = session.handle_line(trimmed).map_err(|e| match e {
            NexusError::Parse { location, message } => NexusError::Parse {
                location: format!("line {}, {}", line_num + 1, location),
                message,
            },
            other => other,
        })?;
        if let Flow::Quit = flow {
            return Ok(Flow::Quit);
        }
    }

    Ok(Flow::Continue)
}

fn print_help() {
    println!(
        r#"Nexus Commands:
  :help, :h, :?        Show this help
  :quit, :q            Exit the REPL
  :mark, :m            Remember the current trail position
  :undo, :u            Backtrack to the last mark
  :backtrack, :b       Undo every binding in the environment
  :commit, :c          Commit environment bindings to the symbol table
  :env, :e             List environment bindings
  :show, :s <name>     Show a symbol record and its resolved value
  :symbols, :sym       List every symbol
  :set <key> <value>   occurs|transactional|strict on|off
                       order arg|young
                       steps|depth N|off

Terms:
  X, _Tail             Variables (scoped to the session)
  _                    Anonymous variable
  john, 42, 2.5, "s"   Constants
  nil, []              The empty list
  likes(john, X)       Structures
  [a, b | T]           Lists

  t1 = t2              Unify two terms and print the bindings

Command line:
  nexus                Start interactive REPL
  nexus <file>         Run a script of REPL lines
  nexus <file> --repl  Run a script then start REPL
"#
    );
}
