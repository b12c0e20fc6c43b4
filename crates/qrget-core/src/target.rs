//! 分享目标
//!
//! 无参数时分享当前目录；一个参数时分享该文件或目录；多个参数报错。

use std::path::{Path, PathBuf};

use crate::error::TargetError;

/// 分享模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServeMode {
    File,
    Directory,
}

/// 本次会话分享的文件或目录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServingTarget {
    path: PathBuf,
    mode: ServeMode,
}

impl ServingTarget {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mode: ServeMode::File,
        }
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mode: ServeMode::Directory,
        }
    }

    /// 根据命令行位置参数确定分享目标
    pub fn from_args(args: &[PathBuf]) -> Result<Self, TargetError> {
        match args {
            [] => {
                let cwd = std::env::current_dir().map_err(TargetError::CurrentDir)?;
                Ok(Self::directory(cwd))
            }
            [path] => Self::from_path(path),
            many => Err(TargetError::TooManyArguments(many.len())),
        }
    }

    /// 单个路径：目录按目录模式分享，其余按文件模式
    pub fn from_path(path: &Path) -> Result<Self, TargetError> {
        let meta = std::fs::metadata(path).map_err(|source| TargetError::NotFound {
            path: path.to_path_buf(),
            source,
        })?;

        if meta.is_dir() {
            Ok(Self::directory(path))
        } else {
            Ok(Self::file(path))
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> ServeMode {
        self.mode
    }

    pub fn is_directory(&self) -> bool {
        self.mode == ServeMode::Directory
    }

    /// 文件名（不含目录部分）
    pub fn file_name(&self) -> Option<String> {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
    }
}
