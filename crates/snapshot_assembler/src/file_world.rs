//! File World - 从 JSON 世界快照文件读取
//!
//! 游戏侧插件周期性地把实体表导出为 JSON，文件每次读取时重新加载。
//! 文件尚不存在时视为世界未就绪。
//!
//! ```json
//! {
//!   "users": [{ "name": "Alice", "connected": true, "character": { "position": { "x": 1, "z": 2 } } }],
//!   "castle_hearts": [{ "position": { "x": 5, "z": 6 }, "level": 2, "owner": { "name": "Alice" } }],
//!   "territories": [{ "position": { "x": 9, "z": 9 } }]
//! }
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use contracts::{ContractError, EntityResult, WorldReader, WorldView};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

/// 世界导出文件的原始结构；实体逐个解析
#[derive(Debug, Deserialize)]
struct WorldDump {
    #[serde(default)]
    users: Vec<Value>,

    #[serde(default)]
    castle_hearts: Vec<Value>,

    /// 缺失或为 null 表示领地数据源不可用
    #[serde(default)]
    territories: Option<Vec<Value>>,
}

/// File World
#[derive(Debug, Clone)]
pub struct FileWorld {
    name: String,
    path: PathBuf,
}

impl FileWorld {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            name: format!("file:{}", path.display()),
            path,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<WorldDump, ContractError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "world file not written yet");
                return Err(ContractError::WorldNotReady);
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }
}

fn resolve_all<T: DeserializeOwned>(entity: &str, values: Vec<Value>) -> Vec<EntityResult<T>> {
    values
        .into_iter()
        .map(|value| {
            serde_json::from_value(value)
                .map_err(|e| ContractError::record_unresolved(entity, e.to_string()))
        })
        .collect()
}

impl WorldReader for FileWorld {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(name = "file_world_read", skip(self), fields(path = %self.path.display()))]
    fn read_world(&self) -> Result<WorldView, ContractError> {
        let dump = self.load()?;
        Ok(WorldView {
            users: resolve_all("user", dump.users),
            castle_hearts: resolve_all("castle_heart", dump.castle_hearts),
            territories: dump
                .territories
                .map(|territories| resolve_all("territory", territories)),
        })
    }
}
