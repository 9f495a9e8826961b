//! Mock 世界
//!
//! 用于单元测试与演示的内存世界，支持注入失败场景。

use std::sync::{Mutex, MutexGuard};

use contracts::{
    CastleHeartEntity, ContractError, TerritoryEntity, UserEntity, WorldReader, WorldView,
};

/// 单个实体：正常值或注入的失败原因
#[derive(Debug, Clone)]
enum MockEntity<T> {
    Ok(T),
    Fail(String),
}

impl<T: Clone> MockEntity<T> {
    fn resolve(&self, entity: &str) -> Result<T, ContractError> {
        match self {
            Self::Ok(value) => Ok(value.clone()),
            Self::Fail(message) => Err(ContractError::record_unresolved(entity, message.clone())),
        }
    }
}

#[derive(Debug, Clone)]
struct MockState {
    ready: bool,
    territories_available: bool,
    users: Vec<MockEntity<UserEntity>>,
    castle_hearts: Vec<MockEntity<CastleHeartEntity>>,
    territories: Vec<MockEntity<TerritoryEntity>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            ready: true,
            territories_available: true,
            users: Vec::new(),
            castle_hearts: Vec::new(),
            territories: Vec::new(),
        }
    }
}

/// Mock 世界
#[derive(Debug, Default)]
pub struct MockWorld {
    state: Mutex<MockState>,
}

impl MockWorld {
    /// 创建空世界 (已就绪)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, user: UserEntity) -> Self {
        self.state().users.push(MockEntity::Ok(user));
        self
    }

    /// 注入一个解析失败的用户
    pub fn with_failing_user(self, message: impl Into<String>) -> Self {
        self.state().users.push(MockEntity::Fail(message.into()));
        self
    }

    pub fn with_castle_heart(self, heart: CastleHeartEntity) -> Self {
        self.state().castle_hearts.push(MockEntity::Ok(heart));
        self
    }

    pub fn with_failing_castle_heart(self, message: impl Into<String>) -> Self {
        self.state()
            .castle_hearts
            .push(MockEntity::Fail(message.into()));
        self
    }

    pub fn with_territory(self, territory: TerritoryEntity) -> Self {
        self.state().territories.push(MockEntity::Ok(territory));
        self
    }

    /// 领地数据源不可用
    pub fn without_territories(self) -> Self {
        self.state().territories_available = false;
        self
    }

    pub fn with_ready(self, ready: bool) -> Self {
        self.set_ready(ready);
        self
    }

    /// 切换世界就绪状态
    pub fn set_ready(&self, ready: bool) {
        self.state().ready = ready;
    }

    /// 替换当前在线用户
    pub fn set_users(&self, users: Vec<UserEntity>) {
        self.state().users = users.into_iter().map(MockEntity::Ok).collect();
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl WorldReader for MockWorld {
    fn name(&self) -> &str {
        "mock"
    }

    fn read_world(&self) -> Result<WorldView, ContractError> {
        let state = self.state();
        if !state.ready {
            return Err(ContractError::WorldNotReady);
        }

        Ok(WorldView {
            users: state.users.iter().map(|u| u.resolve("user")).collect(),
            castle_hearts: state
                .castle_hearts
                .iter()
                .map(|h| h.resolve("castle_heart"))
                .collect(),
            territories: state.territories_available.then(|| {
                state
                    .territories
                    .iter()
                    .map(|t| t.resolve("territory"))
                    .collect()
            }),
        })
    }
}
