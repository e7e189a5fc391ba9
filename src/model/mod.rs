//! Platform records consumed and rewritten by the archiver

pub mod ast;
pub mod comment;
pub mod post;
pub mod project;

pub use ast::{AstElement, AstNode, AstRoot, AstText};
pub use comment::{Comment, CommentBody};
pub use post::{Ask, AstMap, AstSpan, Attachment, AttachmentWrapper, MarkdownBlock, Post, PostBlock};
pub use project::{AskingProject, Project};
