//! Gather orchestration: configure every module, walk the tree, and drive the
//! front end, library generation, and analyzer for each eligible module.

use std::fmt;
use std::path::{Path, PathBuf};

use xvsa_config::{GatherSettings, Reactor};
use xvsa_frontend::{
    AnalyzeCommand, CommonOptions, FrontEndCommand, ToolError, ToolRunner, ToolchainLayout,
};
use xvsa_util::paths;

use crate::configure::{self, ModuleConfig};
use crate::dump;
use crate::error::EngineError;
use crate::library::{LibraryCache, LibraryFilter, OBJECT_SUFFIX};
use crate::registry::SourceRegistry;
use crate::walk;

/// Default working directory name under a module's build directory.
const OUTPUT_DIR_NAME: &str = "xvsa-out";
/// Suffix of compiled units inside an output directory.
const CLASS_SUFFIX: &str = ".class";

/// Tool step a module failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    FrontEnd,
    Analysis,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::FrontEnd => f.write_str("front end"),
            Step::Analysis => f.write_str("analysis"),
        }
    }
}

/// What happened to one walked module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleOutcome {
    /// Not eligible; no tool was invoked.
    Skipped { reason: String },
    /// Lists written, front end disabled for this run.
    Dumped,
    /// Front end (and library generation) ran; analysis disabled.
    FrontEndOnly,
    /// Front end and analyzer both ran.
    Analyzed,
    /// A tool step failed; the walk continued.
    Failed { step: Step, message: String },
}

impl fmt::Display for ModuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleOutcome::Skipped { reason } => write!(f, "skipped ({reason})"),
            ModuleOutcome::Dumped => f.write_str("dumped"),
            ModuleOutcome::FrontEndOnly => f.write_str("translated"),
            ModuleOutcome::Analyzed => f.write_str("analyzed"),
            ModuleOutcome::Failed { step, message } => write!(f, "{step} failed: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleReport {
    pub key: String,
    pub outcome: ModuleOutcome,
}

/// Result of a whole gather run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatherReport {
    /// Shallowest directory containing every walked module.
    pub top_level_dir: PathBuf,
    /// Walked modules in processing order.
    pub modules: Vec<ModuleReport>,
}

impl GatherReport {
    pub fn failures(&self) -> impl Iterator<Item = &ModuleReport> {
        self.modules
            .iter()
            .filter(|m| matches!(m.outcome, ModuleOutcome::Failed { .. }))
    }

    pub fn outcome(&self, key: &str) -> Option<&ModuleOutcome> {
        self.modules.iter().find(|m| m.key == key).map(|m| &m.outcome)
    }
}

/// Run a full gather over `reactor` with the given settings and tool runner.
///
/// # Errors
/// Returns an error on any structural or configuration problem, or when a tool
/// cannot be launched. Tool failures confined to one module are reported in
/// the returned [`GatherReport`] instead.
pub fn gather<R: ToolRunner>(
    reactor: &Reactor,
    settings: &GatherSettings,
    runner: &R,
) -> Result<GatherReport, EngineError> {
    Gatherer::new(settings, runner).run(reactor)
}

/// Carries the per-run state shared across the walk.
pub struct Gatherer<'a, R: ToolRunner> {
    settings: &'a GatherSettings,
    runner: &'a R,
    toolchain: Option<ToolchainLayout>,
    registry: Option<SourceRegistry>,
}

impl<'a, R: ToolRunner> Gatherer<'a, R> {
    pub fn new(settings: &'a GatherSettings, runner: &'a R) -> Self {
        Self {
            settings,
            runner,
            toolchain: settings.install_dir.as_deref().map(ToolchainLayout::new),
            registry: settings.source_list.as_deref().map(SourceRegistry::new),
        }
    }

    /// # Errors
    /// See [`gather`].
    pub fn run(&mut self, reactor: &Reactor) -> Result<GatherReport, EngineError> {
        let root = reactor.execution_root().ok_or(EngineError::NoExecutionRoot)?;
        if !self.settings.skip_front_end && self.toolchain.is_none() {
            return Err(EngineError::NoInstallDir);
        }

        let configs = configure::configure_all(reactor)?;
        let plan = walk::plan(&configs, root)?;

        let mut modules = Vec::with_capacity(plan.order.len());
        for index in plan.order {
            let Some(config) = configs.get(index) else {
                continue;
            };
            let outcome = self.process(config)?;
            tracing::info!(module = %config.key, "{outcome}");
            modules.push(ModuleReport {
                key: config.key.clone(),
                outcome,
            });
        }

        Ok(GatherReport {
            top_level_dir: plan.top_level_dir,
            modules,
        })
    }

    fn process(&mut self, config: &ModuleConfig) -> Result<ModuleOutcome, EngineError> {
        tracing::debug!(
            module = %config.key,
            base_dir = %config.base_dir.display(),
            packaging = %config.packaging,
            "handling module"
        );
        for (key, value) in config.to_properties() {
            tracing::debug!(module = %config.key, "{key} = {value}");
        }

        let work_dir = self.working_dir(config);
        match &work_dir {
            Ok(dir) => {
                dump::dump_module(config, dir, self.registry.as_mut())?;
            }
            Err(e) => tracing::debug!(module = %config.key, "not dumping module lists: {e}"),
        }

        if let Some(reason) = skip_reason(config) {
            tracing::debug!(module = %config.key, "ignoring module: {reason}");
            return Ok(ModuleOutcome::Skipped { reason });
        }
        if self.settings.skip_front_end {
            tracing::info!(module = %config.key, "dump completed, not running the front end");
            return Ok(ModuleOutcome::Dumped);
        }

        let result = work_dir.and_then(|dir| self.run_front_end(config, &dir).map(|()| dir));
        let work_dir = match result {
            Ok(dir) => dir,
            Err(e) => return module_failure(config, Step::FrontEnd, e),
        };

        if !self.settings.run_analysis {
            return Ok(ModuleOutcome::FrontEndOnly);
        }
        match self.run_analyzer(config, &work_dir) {
            Ok(()) => Ok(ModuleOutcome::Analyzed),
            Err(e) => module_failure(config, Step::Analysis, e),
        }
    }

    /// Directory the module's artifacts go into: the configured result
    /// directory, else `<build>/xvsa-out`.
    fn working_dir(&self, config: &ModuleConfig) -> Result<PathBuf, EngineError> {
        let no_dir = |reason: String| EngineError::NoWorkingDir {
            module: config.key.clone(),
            reason,
        };

        if let Some(result_dir) = &self.settings.result_dir {
            let dir = paths::absolute(result_dir);
            if !dir.exists() {
                xvsa_util::fs::ensure_dir(&dir).map_err(|e| no_dir(e.to_string()))?;
            } else if !dir.is_dir() {
                return Err(no_dir(format!("{} is not a directory", dir.display())));
            }
            return Ok(dir);
        }

        let Some(build_dir) = &config.build_dir else {
            return Err(no_dir("no build directory".to_owned()));
        };
        if !xvsa_util::fs::is_writable_dir(build_dir) {
            return Err(no_dir(format!(
                "{} is not a writable directory",
                build_dir.display()
            )));
        }
        let dir = build_dir.join(OUTPUT_DIR_NAME);
        xvsa_util::fs::ensure_dir(&dir).map_err(|e| no_dir(e.to_string()))?;
        Ok(dir)
    }

    fn toolchain(&self) -> Result<&ToolchainLayout, EngineError> {
        self.toolchain.as_ref().ok_or(EngineError::NoInstallDir)
    }

    fn common_options(&self) -> CommonOptions {
        CommonOptions::new()
            .allow_phantom_refs(self.settings.phantom_refs)
            .passthrough(&self.settings.front_end_opts)
    }

    fn run_front_end(&mut self, config: &ModuleConfig, work_dir: &Path) -> Result<(), EngineError> {
        tracing::debug!(module = %config.key, "running front end");
        let front_end = self.toolchain()?.front_end()?;
        let class_dir = config.output_dir.as_deref().ok_or(ToolError::NoClassDir)?;
        let output = work_dir.join(format!("{}{OBJECT_SUFFIX}", config.sanitized_key()));
        let common = self.common_options();

        let mut command = FrontEndCommand::new()
            .class_dir(class_dir)
            .output(&output)
            .source_dirs(&config.sources)
            .classpath(&config.classpath)
            .common(&common);
        if let Some(registry) = &self.registry {
            command = command.source_list_output(registry.path());
        }
        let args = command.build_args()?;

        if let Some(registry) = self.registry.as_mut() {
            registry.pre_run()?;
        }
        let run = self.runner.run(&front_end, &args, work_dir);
        if let Some(registry) = self.registry.as_mut() {
            registry.post_run()?;
        }
        run?;

        if !self.settings.lib_generation {
            tracing::warn!(module = %config.key, "skipping all library v-table generation for module");
            return Ok(());
        }
        let report = LibraryCache::new(self.runner, &front_end, work_dir)
            .jar_filter(LibraryFilter::new(
                &self.settings.lib_jar_filter,
                self.settings.lib_jar_blacklist,
            ))
            .class_filter(
                &self.settings.lib_class_filter,
                self.settings.lib_class_blacklist,
            )
            .generate(config, &common)?;
        tracing::info!(
            module = %config.key,
            "libraries: {} generated, {} reused, {} failed",
            report.generated,
            report.reused,
            report.failed
        );
        Ok(())
    }

    fn run_analyzer(&self, config: &ModuleConfig, work_dir: &Path) -> Result<(), EngineError> {
        tracing::debug!(module = %config.key, "running analyzer");
        let analyzer = self.toolchain()?.analyzer()?;
        let name = config.sanitized_key();
        let object = work_dir.join(format!("{name}{OBJECT_SUFFIX}"));
        let args = AnalyzeCommand::new()
            .output_name(&name)
            .object_file(&object)
            .json(self.settings.json)
            .extra(&self.settings.analysis_opts)
            .runtime(self.settings.runtime_path.as_deref())
            .build_args()?;
        self.runner.run(&analyzer, &args, work_dir)?;
        Ok(())
    }
}

/// Why a module gets no tool invocation, if it doesn't.
fn skip_reason(config: &ModuleConfig) -> Option<String> {
    if config.packaging.is_aggregator() {
        return Some("aggregator module".to_owned());
    }
    let Some(output_dir) = &config.output_dir else {
        return Some("no main output directory".to_owned());
    };
    if !xvsa_util::fs::contains_file_with_suffix(output_dir, CLASS_SUFFIX) {
        return Some("no compiled classes found".to_owned());
    }
    if config.sources.is_empty() {
        return Some("no source roots resolved".to_owned());
    }
    None
}

fn module_failure(
    config: &ModuleConfig,
    step: Step,
    err: EngineError,
) -> Result<ModuleOutcome, EngineError> {
    if !err.is_module_failure() {
        return Err(err);
    }
    tracing::error!(module = %config.key, "run {step} failed: {err}");
    Ok(ModuleOutcome::Failed {
        step,
        message: err.to_string(),
    })
}
