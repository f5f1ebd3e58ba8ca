use crate::config::RenderConfig;
use crate::document::parse_document;
use crate::logger::{RenderStats, RunLog, RunSummary};
use anyhow::{Context, Result};
use safe_dom::Node;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// A rendered document and the output name it will be written under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub name: String,
    pub html: String,
}

pub struct RenderPipeline {
    pub config: RenderConfig,
    pub log: RunLog,
    stats: RenderStats,
    outputs: HashMap<String, PathBuf>,
}

fn output_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document")
        .to_string()
}

impl RenderPipeline {
    pub fn new(config: RenderConfig, log_dir: &Path) -> Result<Self> {
        Ok(RenderPipeline {
            config,
            log: RunLog::open(log_dir).context("Failed to open run log")?,
            stats: RenderStats::default(),
            outputs: HashMap::new(),
        })
    }

    /// Renders every input. A failing input is logged, counted and skipped,
    /// or returned straight away when `fail_fast` is set. Output is written
    /// only when `out_dir` is given.
    pub fn run(&mut self, inputs: &[PathBuf], out_dir: Option<&Path>) -> Result<()> {
        for path in inputs {
            let rendered = match self.render_file(path) {
                Ok(rendered) => rendered,
                Err(e) if self.config.fail_fast => return Err(e),
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    continue;
                }
            };

            if let Some(out_dir) = out_dir {
                self.write_document(out_dir, &rendered)?;
            }
        }
        Ok(())
    }

    /// Reads and renders one input file. Missing or unreadable files and
    /// output-name clashes count as failed documents, like invalid trees.
    pub fn render_file(&mut self, path: &Path) -> Result<Rendered> {
        let name = output_name(path);
        let content = self.claim_output(&name, path).and_then(|()| {
            fs::read_to_string(path).with_context(|| format!("Failed to read document: {:?}", path))
        });
        match content {
            Ok(content) => self.render_document(&content, &name),
            Err(e) => self.record(name, Err(e)),
        }
    }

    /// Renders a document held in memory. Nothing is returned for a document
    /// that fails anywhere along the way.
    pub fn render_document(&mut self, content: &str, name: &str) -> Result<Rendered> {
        let result = Self::render(content, name);
        self.record(name.to_string(), result)
    }

    fn claim_output(&mut self, name: &str, path: &Path) -> Result<()> {
        if let Some(previous) = self.outputs.get(name) {
            anyhow::bail!(
                "{:?} and {:?} would both be written to {}.html",
                previous,
                path,
                name
            );
        }
        self.outputs.insert(name.to_string(), path.to_path_buf());
        Ok(())
    }

    fn record(&mut self, name: String, result: Result<(String, usize)>) -> Result<Rendered> {
        self.stats.documents += 1;

        match result {
            Ok((html, nodes)) => {
                self.stats.nodes += nodes;
                if html.is_empty() {
                    self.log.warn(&name, "Document rendered to an empty string".to_string());
                }
                self.log.info(
                    &name,
                    format!("Rendered {} nodes, {} bytes", nodes, html.len()),
                );
                Ok(Rendered { name, html })
            }
            Err(e) => {
                self.stats.failures += 1;
                self.log.error(&name, format!("{:#}", e));
                Err(e)
            }
        }
    }

    fn render(content: &str, name: &str) -> Result<(String, usize)> {
        let spec = parse_document(content)
            .with_context(|| format!("Failed to parse document: {}", name))?;
        let tree = spec
            .build()
            .with_context(|| format!("Failed to build node tree for {}", name))?;
        let html = tree
            .sanitized()
            .with_context(|| format!("Failed to render node tree for {}", name))?;
        Ok((html, spec.node_count()))
    }

    pub fn write_document(&self, out_dir: &Path, rendered: &Rendered) -> Result<PathBuf> {
        fs::create_dir_all(out_dir)
            .with_context(|| format!("Failed to create output directory: {:?}", out_dir))?;

        let output_path = out_dir.join(format!("{}.html", rendered.name));
        let mut contents = String::with_capacity(rendered.html.len() + 16);
        if self.config.doctype {
            contents.push_str("<!DOCTYPE html>\n");
        }
        contents.push_str(&rendered.html);

        fs::write(&output_path, contents)
            .with_context(|| format!("Failed to write HTML file: {:?}", output_path))?;

        self.log
            .info(&rendered.name, format!("Wrote {}", output_path.display()));

        Ok(output_path)
    }

    /// Closes the run log with its summary and prunes old runs.
    pub fn finalize(&self) -> Result<RunSummary> {
        let summary = self
            .log
            .finish(self.stats.clone())
            .context("Failed to write run summary")?;
        self.log
            .prune(self.config.max_log_builds)
            .context("Failed to prune old run logs")?;
        Ok(summary)
    }
}
