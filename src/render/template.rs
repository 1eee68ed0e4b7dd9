//! HTML template set
//!
//! Templates are loaded during setup (glob pattern or explicit file list) and
//! executed by name at request time. Each template is registered under its
//! file name, so `templates/index.html` is executed as `"index.html"`.

use crate::error::{Error, Result};
use minijinja::Environment;
use serde::Serialize;
use std::io;
use std::path::Path;

/// Named templates shared read-only by every request
#[derive(Clone)]
pub struct TemplateSet {
    env: Environment<'static>,
}

impl TemplateSet {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
        }
    }

    /// Template environment, for registering functions and filters before loading
    pub fn env_mut(&mut self) -> &mut Environment<'static> {
        &mut self.env
    }

    /// Register a template from source
    pub fn add_template(&mut self, name: &str, source: &str) -> Result<()> {
        self.env
            .add_template_owned(name.to_string(), source.to_string())?;
        Ok(())
    }

    /// Load every file matching `pattern`; fails when nothing matches
    pub fn parse_glob(&mut self, pattern: &str) -> Result<usize> {
        let mut loaded = 0;
        for entry in glob::glob(pattern)? {
            let path = entry.map_err(io::Error::from)?;
            if path.is_file() {
                self.parse_file(&path)?;
                loaded += 1;
            }
        }
        if loaded == 0 {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("pattern matches no files: {pattern}"),
            )));
        }
        Ok(loaded)
    }

    /// Load an explicit list of template files
    pub fn parse_files<P: AsRef<Path>>(&mut self, files: &[P]) -> Result<()> {
        if files.is_empty() {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "no template files named",
            )));
        }
        for file in files {
            self.parse_file(file.as_ref())?;
        }
        Ok(())
    }

    fn parse_file(&mut self, path: &Path) -> Result<()> {
        let source = std::fs::read_to_string(path)?;
        let name = path
            .file_name()
            .map_or_else(|| path.to_string_lossy(), |n| n.to_string_lossy())
            .into_owned();
        self.env.add_template_owned(name, source)?;
        Ok(())
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }

    /// Execute the named template against `data`, writing into `out`
    pub fn execute<T, W>(&self, name: &str, data: &T, mut out: W) -> Result<()>
    where
        T: Serialize + ?Sized,
        W: io::Write,
    {
        let template = self.env.get_template(name)?;
        let rendered = template.render(data)?;
        out.write_all(rendered.as_bytes())?;
        Ok(())
    }
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    #[test]
    fn test_execute_named_template() {
        let mut set = TemplateSet::new();
        set.add_template("hello.html", "<h1>Hello {{ name }}!</h1>")
            .unwrap();
        let mut out = Vec::new();
        set.execute("hello.html", &json!({ "name": "World" }), &mut out)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "<h1>Hello World!</h1>");
    }

    #[test]
    fn test_html_autoescape() {
        let mut set = TemplateSet::new();
        set.add_template("page.html", "{{ body }}").unwrap();
        let mut out = Vec::new();
        set.execute("page.html", &json!({ "body": "<b>" }), &mut out)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "&lt;b&gt;");
    }

    #[test]
    fn test_parse_glob_names_by_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "index {{ n }}").unwrap();
        fs::write(dir.path().join("about.html"), "about").unwrap();
        fs::write(dir.path().join("notes.txt"), "skip").unwrap();

        let mut set = TemplateSet::new();
        let pattern = format!("{}/*.html", dir.path().display());
        assert_eq!(set.parse_glob(&pattern).unwrap(), 2);
        assert!(set.has_template("index.html"));
        assert!(set.has_template("about.html"));
        assert!(!set.has_template("notes.txt"));
    }

    #[test]
    fn test_parse_glob_no_match() {
        let dir = tempfile::tempdir().unwrap();
        let mut set = TemplateSet::new();
        let pattern = format!("{}/*.html", dir.path().display());
        assert!(set.parse_glob(&pattern).is_err());
    }

    #[test]
    fn test_missing_template_is_error() {
        let set = TemplateSet::new();
        let mut out = Vec::new();
        assert!(matches!(
            set.execute("nope.html", &json!({}), &mut out),
            Err(Error::Template(_))
        ));
    }

    #[test]
    fn test_custom_function() {
        let mut set = TemplateSet::new();
        set.env_mut()
            .add_function("shout", |s: String| s.to_uppercase());
        set.add_template("f.txt", "{{ shout(word) }}").unwrap();
        let mut out = Vec::new();
        set.execute("f.txt", &json!({ "word": "hi" }), &mut out)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "HI");
    }
}
