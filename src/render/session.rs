//! Per-render block state.

use std::collections::HashMap;

use super::BlockRenderer;
use crate::core::{Context, Result, ViewError};
use crate::expr::Vars;

/// Block that implicitly wraps every top-level template's output.
pub const CONTENT_BLOCK: &str = "content";

/// An open capture.
#[derive(Debug)]
pub(super) struct Frame {
    pub(super) name: String,
    pub(super) buffer: String,
    /// Opened by the renderer rather than by a `@section`
    pub(super) implicit: bool,
}

/// State of one render: the block store, the stack of open captures and the
/// inheritance chain walked so far.
///
/// A session is created for every [`BlockRenderer::render`] call and dropped
/// with it, so no block survives across renders. The block API is public so
/// hosts can drive a session by hand:
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use vellum::config::ViewConfig;
/// # use vellum::render::BlockRenderer;
/// # use vellum::store::{MemoryArtifactStore, MemorySourceStore};
/// # let renderer = BlockRenderer::new(
/// #     Arc::new(MemorySourceStore::new()),
/// #     Arc::new(MemoryArtifactStore::new()),
/// #     vellum::config::ViewConfig::default(),
/// # );
/// let mut session = renderer.session();
/// session.begin("title");
/// session.write("a");
/// session.end(false)?;
/// session.begin("title");
/// session.write("b");
/// session.end(false)?;
/// assert_eq!(session.block("title", "")?, "ab");
/// # Ok::<(), vellum::core::ViewError>(())
/// ```
pub struct RenderSession<'r> {
    pub(super) renderer: &'r BlockRenderer,
    blocks: HashMap<String, String>,
    pub(super) stack: Vec<Frame>,
    /// Output written while no capture is open
    output: String,
    /// Parent registered by the template being executed
    parent: Option<String>,
    chain: Vec<String>,
    pub(super) include_depth: usize,
    /// Whether the current template closed an explicit `content` block
    content_claimed: bool,
}

impl<'r> RenderSession<'r> {
    pub(super) fn new(renderer: &'r BlockRenderer) -> Self {
        Self {
            renderer,
            blocks: HashMap::new(),
            stack: Vec::new(),
            output: String::new(),
            parent: None,
            chain: Vec::new(),
            include_depth: 0,
            content_claimed: false,
        }
    }

    /// Open a capture named `name`.
    pub fn begin(&mut self, name: impl Into<String>) {
        self.push_frame(name.into(), false);
    }

    fn push_frame(&mut self, name: String, implicit: bool) {
        self.stack.push(Frame {
            name,
            buffer: String::new(),
            implicit,
        });
    }

    /// Append text to the innermost open capture.
    pub fn write(&mut self, text: &str) {
        match self.stack.last_mut() {
            Some(frame) => frame.buffer.push_str(text),
            None => self.output.push_str(text),
        }
    }

    /// Close the innermost capture and store it, returning its name.
    ///
    /// The captured text replaces the block when `overwrite` is set or the
    /// block is still empty; otherwise it is appended.
    pub fn end(&mut self, overwrite: bool) -> Result<String> {
        let frame = self.stack.pop().ok_or(ViewError::UnbalancedEnd)?;
        if frame.name == CONTENT_BLOCK && !frame.implicit {
            self.content_claimed = true;
        }
        self.store(&frame.name, frame.buffer, overwrite);
        Ok(frame.name)
    }

    fn store(&mut self, name: &str, text: String, overwrite: bool) {
        match self.blocks.get_mut(name) {
            Some(existing) if !overwrite && !existing.is_empty() => existing.push_str(&text),
            _ => {
                self.blocks.insert(name.to_string(), text);
            }
        }
    }

    /// Stored content of `name`, or `default` when it was never set.
    ///
    /// Reading a block that is still open returns what was stored before it
    /// was opened. That is logged, or rejected with
    /// [`ViewError::BlockReadWhileOpen`] when `strict_blocks` is enabled.
    pub fn block(&self, name: &str, default: &str) -> Result<String> {
        if self.stack.iter().any(|f| !f.implicit && f.name == name) {
            if self.renderer.config().strict_blocks {
                return Err(ViewError::BlockReadWhileOpen {
                    name: name.to_string(),
                });
            }
            tracing::warn!("Block '{name}' is read while it is still open");
        }
        Ok(self.blocks.get(name).map_or_else(|| default.to_string(), Clone::clone))
    }

    pub fn has_block(&self, name: &str) -> bool {
        self.blocks.contains_key(name)
    }

    /// Register `name` as the parent of the template being rendered.
    ///
    /// Only the first call per template counts.
    pub fn extend(&mut self, name: impl Into<String>) {
        let name = name.into();
        match &self.parent {
            None => {
                tracing::debug!("Queued parent template '{name}'");
                self.parent = Some(name);
            }
            Some(existing) => {
                tracing::warn!("Ignoring @extends('{name}'): parent '{existing}' already set");
            }
        }
    }

    /// Execute another template inline with a copy of `data`.
    pub fn include(&mut self, name: &str, data: &Context) -> Result<()> {
        self.include_vars(name, data.as_map())
    }

    pub(super) fn include_vars(&mut self, name: &str, vars: &Vars) -> Result<()> {
        let limit = self.renderer.config().max_include_depth;
        if self.include_depth >= limit {
            return Err(ViewError::DepthExceeded {
                kind: "include",
                limit,
                template: name.to_string(),
            });
        }
        let program = self.renderer.compiler().ensure_fresh(name)?;

        let floor = self.stack.len();
        let mut scope = vars.clone();
        // A content section closed by the included template belongs to it,
        // not to the includer.
        let claimed = self.content_claimed;
        self.include_depth += 1;
        let result = self.execute(name, &program.nodes, &mut scope, floor);
        self.include_depth -= 1;
        self.content_claimed = claimed;
        result?;

        self.check_closed(name, floor)
    }

    /// Fail when a template left captures open above `floor`.
    fn check_closed(&self, template: &str, floor: usize) -> Result<()> {
        match self.stack.get(floor) {
            Some(frame) => Err(ViewError::UnclosedBlock {
                template: template.to_string(),
                name: frame.name.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Render `name` and its parent chain, returning the final content.
    pub(super) fn run(&mut self, name: &str, data: &Context) -> Result<String> {
        let limit = self.renderer.config().max_inheritance_depth;
        let mut next = Some(name.to_string());

        while let Some(current) = next.take() {
            if self.chain.contains(&current) {
                let mut chain = std::mem::take(&mut self.chain);
                chain.push(current);
                return Err(ViewError::InheritanceCycle {
                    chain,
                });
            }
            if self.chain.len() > limit {
                return Err(ViewError::DepthExceeded {
                    kind: "inheritance",
                    limit,
                    template: current,
                });
            }
            self.chain.push(current.clone());

            self.run_one(&current, data)?;
            next = self.parent.take();
        }

        Ok(self.blocks.remove(CONTENT_BLOCK).unwrap_or_default())
    }

    fn run_one(&mut self, name: &str, data: &Context) -> Result<()> {
        tracing::debug!("Rendering '{name}'");
        let program = self.renderer.compiler().ensure_fresh(name)?;

        self.content_claimed = false;
        let floor = self.stack.len();
        self.push_frame(CONTENT_BLOCK.to_string(), true);

        let mut vars = data.as_map().clone();
        self.execute(name, &program.nodes, &mut vars, floor + 1)?;
        self.check_closed(name, floor + 1)?;

        let frame = self.stack.pop().ok_or(ViewError::UnbalancedEnd)?;
        if self.content_claimed {
            tracing::debug!("'{name}' defined an explicit content section; dropping its loose output");
        } else {
            self.store(CONTENT_BLOCK, frame.buffer, true);
        }
        Ok(())
    }

    /// Text written while no capture was open.
    pub fn into_output(self) -> String {
        self.output
    }
}
