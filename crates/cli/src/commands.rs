use crate::response::CommandResponse;
use crate::{AsyncView, Commands, FilteredArgs, StateView, TypeView};
use anyhow::Result;
use cljscope_analyzer::{AnalyzerError, NameFilter};
use cljscope_graph::GraphBuilder;

/// Run one subcommand against already loaded source text
pub fn execute(command: &Commands, code: &str, graphs: &GraphBuilder) -> Result<CommandResponse> {
    let analyzer = graphs.analyzer();

    match command {
        Commands::Functions(args) => {
            let filter = name_filter(args)?;
            let found = analyzer.find_functions(code, filter.as_ref());
            if let (Some(name), true) = (&args.name, found.is_empty()) {
                let available = analyzer
                    .find_functions(code, None)
                    .into_iter()
                    .map(|f| f.name)
                    .collect();
                return Ok(CommandResponse::not_found(
                    format!("Function \"{name}\" not found"),
                    available,
                ));
            }
            CommandResponse::ok(found)
        }
        Commands::Macros(args) => {
            if args.threading_only {
                return CommandResponse::ok(analyzer.find_threading_macros(code));
            }
            let filter = name_filter(&args.filter)?;
            CommandResponse::ok(analyzer.find_macros(code, filter.as_ref()))
        }
        Commands::Namespaces(_) => CommandResponse::ok(analyzer.find_namespaces(code)),
        Commands::Deps(_) => CommandResponse::ok(analyzer.find_dependencies(code)),
        Commands::Protocols(args) => {
            let filter = name_filter(&args.filter)?;
            let found = match args.only {
                TypeView::All => analyzer.find_protocols_and_types(code, filter.as_ref()),
                TypeView::Protocols => analyzer.find_protocols(code, filter.as_ref()),
                TypeView::Types => analyzer.find_types(code, filter.as_ref()),
            };
            CommandResponse::ok(found)
        }
        Commands::Destructuring(args) => {
            if args.summary {
                CommandResponse::ok(analyzer.destructuring_summary(code))
            } else {
                CommandResponse::ok(analyzer.find_destructuring(code, args.kind))
            }
        }
        Commands::Async(args) => match args.view {
            AsyncView::All => {
                let filter = pattern_filter(args.pattern.as_deref())?;
                CommandResponse::ok(analyzer.find_async_patterns(code, filter.as_ref()))
            }
            AsyncView::GoBlocks => CommandResponse::ok(analyzer.find_go_blocks(code)),
            AsyncView::Channels => CommandResponse::ok(analyzer.find_channel_operations(code)),
            AsyncView::Summary => CommandResponse::ok(analyzer.concurrency_summary(code)),
        },
        Commands::State(args) => match args.view {
            StateView::All => {
                let filter = pattern_filter(args.pattern.as_deref())?;
                CommandResponse::ok(analyzer.find_state_operations(code, filter.as_ref()))
            }
            StateView::Atoms => CommandResponse::ok(analyzer.find_atoms(code)),
            StateView::Mutations => CommandResponse::ok(analyzer.find_state_mutations(code)),
            StateView::Summary => CommandResponse::ok(analyzer.state_summary(code)),
        },
        Commands::At(args) => {
            let (line, column) = (args.line, args.column);
            if args.form {
                return match analyzer.form_at(code, line, column) {
                    Ok(form) => CommandResponse::ok(form),
                    Err(err) => cursor_not_found(err),
                };
            }
            if let Some(direction) = args.navigate {
                return match analyzer.navigate(code, line, column, direction) {
                    Ok(Some(target)) => CommandResponse::ok(target),
                    Ok(None) => Ok(CommandResponse::not_found(
                        format!("No form in direction `{}`", direction.as_str()),
                        Vec::new(),
                    )),
                    Err(err) => cursor_not_found(err),
                };
            }
            if args.matching {
                return match analyzer.matching_delimiter(code, line, column) {
                    Some(partner) => CommandResponse::ok(partner),
                    None => Ok(CommandResponse::not_found(
                        format!("No matching delimiter at position {line}:{column}"),
                        Vec::new(),
                    )),
                };
            }

            let report = analyzer.analyze_at(code, line, column);
            match &report.error {
                Some(message) => Ok(CommandResponse::not_found(message.clone(), Vec::new())),
                None => CommandResponse::ok(report),
            }
        }
        Commands::Calls(args) => {
            let target = args.function.as_deref();
            let result = match target {
                Some(name) if args.dependencies_only => graphs
                    .find_function_dependencies(code, name)
                    .map(serde_json::to_value),
                _ => graphs
                    .trace_function_calls(code, target)
                    .map(serde_json::to_value),
            };
            match result {
                Ok(data) => CommandResponse::ok(data?),
                Err(err) => Ok(CommandResponse::from_graph_error(&err)),
            }
        }
        Commands::NsGraph(args) => {
            let target = args.namespace.as_deref();
            let result = match target {
                Some(root) if args.tree => graphs
                    .namespace_dependency_tree(code, root)
                    .map(serde_json::to_value),
                _ => graphs
                    .analyze_namespace_dependencies(code, target)
                    .map(serde_json::to_value),
            };
            match result {
                Ok(data) => CommandResponse::ok(data?),
                Err(err) => Ok(CommandResponse::from_graph_error(&err)),
            }
        }
        Commands::Idioms(args) => {
            CommandResponse::ok(analyzer.summarize_idioms(code, args.filter.as_deref()))
        }
    }
}

fn name_filter(args: &FilteredArgs) -> Result<Option<NameFilter>> {
    match (&args.name, &args.pattern) {
        (Some(name), _) => Ok(Some(NameFilter::exact(name.clone()))),
        (None, pattern) => pattern_filter(pattern.as_deref()),
    }
}

fn pattern_filter(pattern: Option<&str>) -> Result<Option<NameFilter>> {
    Ok(pattern.map(NameFilter::pattern).transpose()?)
}

fn cursor_not_found(err: AnalyzerError) -> Result<CommandResponse> {
    if err.is_not_found() {
        return Ok(CommandResponse::not_found(err.to_string(), Vec::new()));
    }
    Err(err.into())
}
