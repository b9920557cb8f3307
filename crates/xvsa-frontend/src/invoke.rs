//! Argument builders for front-end, library-only, and analyzer invocations.

use std::path::{Path, PathBuf};

use crate::error::ToolError;

/// Flags shared by every front-end invocation of a run.
#[derive(Debug, Clone, Default)]
pub struct CommonOptions {
    allow_phantom_refs: bool,
    passthrough: Vec<String>,
}

impl CommonOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tolerate references to classes that cannot be found on the classpath.
    pub fn allow_phantom_refs(mut self, enabled: bool) -> Self {
        self.allow_phantom_refs = enabled;
        self
    }

    /// Extra flags forwarded verbatim.
    pub fn passthrough(mut self, opts: &[String]) -> Self {
        self.passthrough = opts.to_vec();
        self
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![format!("-allow-phantom-refs={}", self.allow_phantom_refs)];
        args.extend(self.passthrough.iter().cloned());
        args
    }
}

/// Builder for translating one module's compiled classes into an object artifact.
#[derive(Debug, Default)]
pub struct FrontEndCommand {
    class_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    source_list_output: Option<PathBuf>,
    source_dirs: Vec<PathBuf>,
    classpath: Vec<PathBuf>,
    common: CommonOptions,
}

impl FrontEndCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory holding the module's compiled classes.
    pub fn class_dir(mut self, path: &Path) -> Self {
        self.class_dir = Some(path.to_path_buf());
        self
    }

    /// Object artifact to produce.
    pub fn output(mut self, path: &Path) -> Self {
        self.output = Some(path.to_path_buf());
        self
    }

    /// Registry file the front end appends discovered source paths to.
    pub fn source_list_output(mut self, path: &Path) -> Self {
        self.source_list_output = Some(path.to_path_buf());
        self
    }

    pub fn source_dirs(mut self, paths: &[PathBuf]) -> Self {
        self.source_dirs = paths.to_vec();
        self
    }

    pub fn classpath(mut self, paths: &[PathBuf]) -> Self {
        self.classpath = paths.to_vec();
        self
    }

    pub fn common(mut self, common: &CommonOptions) -> Self {
        self.common = common.clone();
        self
    }

    /// Build the argument list without executing.
    ///
    /// Source roots that are not directories (the descriptor file, for
    /// instance) and classpath entries that do not exist are left out.
    ///
    /// # Errors
    /// Returns an error if no source root is an existing directory, or no class
    /// directory or output is set.
    pub fn build_args(&self) -> Result<Vec<String>, ToolError> {
        let source_dirs: Vec<&PathBuf> = self.source_dirs.iter().filter(|d| d.is_dir()).collect();
        if source_dirs.is_empty() {
            return Err(ToolError::NoSourceDirs);
        }
        let Some(class_dir) = &self.class_dir else {
            return Err(ToolError::NoClassDir);
        };
        let Some(output) = &self.output else {
            return Err(ToolError::NoOutput);
        };

        let mut args = vec![
            format!("-fD,{}", class_dir.display()),
            format!("-fB,{}", output.display()),
        ];
        if let Some(list) = &self.source_list_output {
            args.push(format!("-srcPathOutput,{}", list.display()));
        }
        for dir in source_dirs {
            args.push(format!("-srcdir={}", dir.display()));
        }
        for entry in self.classpath.iter().filter(|p| p.exists()) {
            args.push(format!("-cp={}", entry.display()));
        }
        args.extend(self.common.to_args());
        Ok(args)
    }
}

/// Builder for generating the v-table artifact of a single library.
#[derive(Debug, Default)]
pub struct LibraryCommand {
    common: CommonOptions,
    class_filter: Vec<String>,
    class_blacklist: bool,
    library: Option<PathBuf>,
    output: Option<PathBuf>,
}

impl LibraryCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn common(mut self, common: &CommonOptions) -> Self {
        self.common = common.clone();
        self
    }

    /// Class-name filter criteria and their polarity (`true` = exclude matches).
    pub fn class_filter(mut self, criteria: &[String], blacklist: bool) -> Self {
        self.class_filter = criteria.to_vec();
        self.class_blacklist = blacklist;
        self
    }

    pub fn library(mut self, path: &Path) -> Self {
        self.library = Some(path.to_path_buf());
        self
    }

    pub fn output(mut self, path: &Path) -> Self {
        self.output = Some(path.to_path_buf());
        self
    }

    /// # Errors
    /// Returns an error if the library or output path is not set.
    pub fn build_args(&self) -> Result<Vec<String>, ToolError> {
        let (Some(library), Some(output)) = (&self.library, &self.output) else {
            return Err(ToolError::NoOutput);
        };

        let mut args = self.common.to_args();
        args.push("-VTABLE=true".to_owned());
        args.push("-libGenOnly=true".to_owned());
        args.push(format!("-libFilterBlackList={}", self.class_blacklist));
        for criteria in &self.class_filter {
            args.push(format!("-libFilter={criteria}"));
        }
        args.push(format!("-fC,{}", library.display()));
        args.push(format!("-fB,{}", output.display()));
        Ok(args)
    }
}

/// Builder for an analyzer run over one module's object artifact.
#[derive(Debug, Default)]
pub struct AnalyzeCommand {
    output_name: Option<String>,
    object_file: Option<PathBuf>,
    json: bool,
    extra: Vec<String>,
    runtime: Option<PathBuf>,
}

impl AnalyzeCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base name of the report the analyzer writes.
    pub fn output_name(mut self, name: &str) -> Self {
        self.output_name = Some(name.to_owned());
        self
    }

    pub fn object_file(mut self, path: &Path) -> Self {
        self.object_file = Some(path.to_path_buf());
        self
    }

    pub fn json(mut self, enabled: bool) -> Self {
        self.json = enabled;
        self
    }

    pub fn extra(mut self, opts: &[String]) -> Self {
        self.extra = opts.to_vec();
        self
    }

    /// Runtime library object; only passed when it exists.
    pub fn runtime(mut self, path: Option<&Path>) -> Self {
        self.runtime = path.map(Path::to_path_buf);
        self
    }

    /// # Errors
    /// Returns an error if the output name is unset, or the object file is unset
    /// or missing on disk.
    pub fn build_args(&self) -> Result<Vec<String>, ToolError> {
        let Some(name) = &self.output_name else {
            return Err(ToolError::NoOutput);
        };
        let Some(object) = &self.object_file else {
            return Err(ToolError::NoOutput);
        };
        if !object.exists() {
            return Err(ToolError::MissingObject {
                path: object.clone(),
            });
        }

        let mut args: Vec<String> = [
            "-xfa",
            "-VSA:certj=1",
            "-VSA:exp=1",
            "-VSA:new_npd=1",
            "-o",
            name.as_str(),
            "-kp",
            "-sw",
        ]
        .iter()
        .map(|s| (*s).to_owned())
        .collect();
        if self.json {
            args.push("-json".to_owned());
        }
        args.extend(self.extra.iter().cloned());
        args.push(object.display().to_string());
        if let Some(runtime) = self.runtime.as_ref().filter(|p| p.exists()) {
            args.push(runtime.display().to_string());
        }
        Ok(args)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn common_options_args() {
        let common = CommonOptions::new()
            .allow_phantom_refs(true)
            .passthrough(&["-v".to_owned(), "-dumpIR".to_owned()]);
        assert_eq!(
            common.to_args(),
            vec!["-allow-phantom-refs=true", "-v", "-dumpIR"]
        );
        assert_eq!(
            CommonOptions::new().to_args(),
            vec!["-allow-phantom-refs=false"]
        );
    }

    #[test]
    fn front_end_args_order_and_filtering() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        let classes = tmp.path().join("classes");
        let lib = tmp.path().join("guava.jar");
        let pom = tmp.path().join("pom.xml");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&classes).unwrap();
        fs::write(&lib, b"").unwrap();
        fs::write(&pom, b"").unwrap();
        let out = tmp.path().join("com.acme-core.o");

        let args = FrontEndCommand::new()
            .class_dir(&classes)
            .output(&out)
            .source_dirs(&[pom, src.clone()])
            .classpath(&[lib.clone(), tmp.path().join("missing.jar")])
            .common(&CommonOptions::new().allow_phantom_refs(true))
            .build_args()
            .unwrap();

        assert_eq!(
            args,
            vec![
                format!("-fD,{}", classes.display()),
                format!("-fB,{}", out.display()),
                format!("-srcdir={}", src.display()),
                format!("-cp={}", lib.display()),
                "-allow-phantom-refs=true".to_owned(),
            ]
        );
    }

    #[test]
    fn front_end_args_with_source_list() {
        let tmp = tempfile::tempdir().unwrap();
        let args = FrontEndCommand::new()
            .class_dir(tmp.path())
            .output(&tmp.path().join("m.o"))
            .source_list_output(Path::new("/tmp/sources.json"))
            .source_dirs(&[tmp.path().to_path_buf()])
            .build_args()
            .unwrap();
        assert_eq!(args.get(2).map(String::as_str), Some("-srcPathOutput,/tmp/sources.json"));
    }

    #[test]
    fn front_end_without_sources_fails_fast() {
        let err = FrontEndCommand::new()
            .class_dir(Path::new("/c"))
            .output(Path::new("/o.o"))
            .build_args()
            .unwrap_err();
        assert!(matches!(err, ToolError::NoSourceDirs));
    }

    #[test]
    fn front_end_with_only_descriptor_file_fails_fast() {
        let tmp = tempfile::tempdir().unwrap();
        let pom = tmp.path().join("pom.xml");
        fs::write(&pom, b"<project/>").unwrap();
        let err = FrontEndCommand::new()
            .class_dir(tmp.path())
            .output(&tmp.path().join("m.o"))
            .source_dirs(&[pom, tmp.path().join("src/main/java")])
            .build_args()
            .unwrap_err();
        assert!(matches!(err, ToolError::NoSourceDirs));
    }

    #[test]
    fn front_end_without_output_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let err = FrontEndCommand::new()
            .class_dir(Path::new("/c"))
            .source_dirs(&[tmp.path().to_path_buf()])
            .build_args()
            .unwrap_err();
        assert!(matches!(err, ToolError::NoOutput));
    }

    #[test]
    fn library_args() {
        let args = LibraryCommand::new()
            .common(&CommonOptions::new().allow_phantom_refs(true))
            .class_filter(&["com.google".to_owned()], false)
            .library(Path::new("/repo/guava-31.jar"))
            .output(Path::new("/work/guava-31-jar.o"))
            .build_args()
            .unwrap();
        assert_eq!(
            args,
            vec![
                "-allow-phantom-refs=true",
                "-VTABLE=true",
                "-libGenOnly=true",
                "-libFilterBlackList=false",
                "-libFilter=com.google",
                "-fC,/repo/guava-31.jar",
                "-fB,/work/guava-31-jar.o",
            ]
        );
    }

    #[test]
    fn analyze_args_with_json_and_runtime() {
        let tmp = tempfile::tempdir().unwrap();
        let object = tmp.path().join("com.acme-core.o");
        let runtime = tmp.path().join("rt.o");
        fs::write(&object, b"").unwrap();
        fs::write(&runtime, b"").unwrap();

        let args = AnalyzeCommand::new()
            .output_name("com.acme-core")
            .object_file(&object)
            .json(true)
            .extra(&["-VSA:level=2".to_owned()])
            .runtime(Some(&runtime))
            .build_args()
            .unwrap();

        assert_eq!(
            args,
            vec![
                "-xfa".to_owned(),
                "-VSA:certj=1".to_owned(),
                "-VSA:exp=1".to_owned(),
                "-VSA:new_npd=1".to_owned(),
                "-o".to_owned(),
                "com.acme-core".to_owned(),
                "-kp".to_owned(),
                "-sw".to_owned(),
                "-json".to_owned(),
                "-VSA:level=2".to_owned(),
                object.display().to_string(),
                runtime.display().to_string(),
            ]
        );
    }

    #[test]
    fn analyze_skips_missing_runtime() {
        let tmp = tempfile::tempdir().unwrap();
        let object = tmp.path().join("m.o");
        fs::write(&object, b"").unwrap();
        let args = AnalyzeCommand::new()
            .output_name("m")
            .object_file(&object)
            .runtime(Some(&tmp.path().join("rt.o")))
            .build_args()
            .unwrap();
        assert_eq!(args.last(), Some(&object.display().to_string()));
        assert!(!args.contains(&"-json".to_owned()));
    }

    #[test]
    fn analyze_requires_object_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = AnalyzeCommand::new()
            .output_name("m")
            .object_file(&tmp.path().join("m.o"))
            .build_args()
            .unwrap_err();
        assert!(matches!(err, ToolError::MissingObject { .. }));
    }
}
