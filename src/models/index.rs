//! 按名称 / ID 查找实体
//!
//! 名称不保证唯一，ID 唯一。按名称查找命中多个实体时返回 `LookupError::Ambiguous`，
//! 调用方需改用 ID。

use std::collections::HashMap;

use crate::error::{EntityType, LookupError};
use crate::models::assignment::Assignment;
use crate::models::course::Course;
use crate::models::question::Question;
use crate::models::roster::RosterMember;

/// 可被索引的实体
pub trait Indexed {
    const ENTITY: EntityType;

    /// 显示名称（不一定唯一）
    fn index_name(&self) -> &str;

    /// 唯一标识
    fn index_key(&self) -> &str;
}

impl Indexed for Course {
    const ENTITY: EntityType = EntityType::Course;

    fn index_name(&self) -> &str {
        &self.name
    }

    fn index_key(&self) -> &str {
        self.id.as_str()
    }
}

impl Indexed for Assignment {
    const ENTITY: EntityType = EntityType::Assignment;

    fn index_name(&self) -> &str {
        &self.name
    }

    fn index_key(&self) -> &str {
        self.id.as_str()
    }
}

/// 成员以邮箱为唯一标识
impl Indexed for RosterMember {
    const ENTITY: EntityType = EntityType::RosterMember;

    fn index_name(&self) -> &str {
        &self.name
    }

    fn index_key(&self) -> &str {
        &self.email
    }
}

impl Indexed for Question {
    const ENTITY: EntityType = EntityType::Question;

    fn index_name(&self) -> &str {
        &self.title
    }

    fn index_key(&self) -> &str {
        self.id.as_str()
    }
}

/// 实体索引，保持插入顺序
#[derive(Debug, Clone)]
pub struct EntityIndex<E> {
    entries: Vec<E>,
    by_key: HashMap<String, usize>,
    by_name: HashMap<String, Vec<usize>>,
}

impl<E> Default for EntityIndex<E> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            by_key: HashMap::new(),
            by_name: HashMap::new(),
        }
    }
}

impl<E: Indexed> EntityIndex<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由实体列表构建索引，ID 重复时失败
    pub fn build(entities: impl IntoIterator<Item = E>) -> Result<Self, LookupError> {
        let mut index = Self::new();
        for entity in entities {
            index.insert(entity)?;
        }
        Ok(index)
    }

    pub fn insert(&mut self, entity: E) -> Result<(), LookupError> {
        let key = entity.index_key().to_string();
        if self.by_key.contains_key(&key) {
            return Err(LookupError::DuplicateId {
                entity: E::ENTITY,
                id: key,
            });
        }

        let pos = self.entries.len();
        self.by_name
            .entry(entity.index_name().to_string())
            .or_default()
            .push(pos);
        self.by_key.insert(key, pos);
        self.entries.push(entity);
        Ok(())
    }

    pub fn get_by_key(&self, key: &str) -> Result<&E, LookupError> {
        self.by_key
            .get(key)
            .map(|&pos| &self.entries[pos])
            .ok_or_else(|| LookupError::NotFound {
                entity: E::ENTITY,
                key: key.to_string(),
            })
    }

    /// 按名称查找，名称必须唯一
    pub fn get_by_name(&self, name: &str) -> Result<&E, LookupError> {
        match self.by_name.get(name).map(Vec::as_slice) {
            None | Some([]) => Err(LookupError::NotFound {
                entity: E::ENTITY,
                key: name.to_string(),
            }),
            Some([pos]) => Ok(&self.entries[*pos]),
            Some(many) => Err(LookupError::Ambiguous {
                entity: E::ENTITY,
                key: name.to_string(),
                count: many.len(),
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<E> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ids::{CourseId, MembershipId};
    use crate::models::roster::MemberRole;

    fn member(name: &str, email: &str, id: &str) -> RosterMember {
        RosterMember {
            course_id: CourseId::new("1"),
            membership_id: MembershipId::new(id),
            name: name.to_string(),
            email: email.to_string(),
            sid: None,
            role: MemberRole::Student,
        }
    }

    #[test]
    fn test_lookup_by_name_and_key() {
        let index = EntityIndex::build(vec![
            member("Ada", "ada@example.edu", "1"),
            member("Alan", "alan@example.edu", "2"),
            member("Alan", "alan2@example.edu", "3"),
        ])
        .unwrap();

        assert_eq!(index.len(), 3);
        assert_eq!(index.get_by_name("Ada").unwrap().email, "ada@example.edu");
        assert_eq!(
            index.get_by_key("alan2@example.edu").unwrap().membership_id,
            "3"
        );
        assert_eq!(
            index.get_by_name("Alan").unwrap_err(),
            LookupError::Ambiguous {
                entity: EntityType::RosterMember,
                key: "Alan".to_string(),
                count: 2
            }
        );
        assert!(matches!(
            index.get_by_name("Grace"),
            Err(LookupError::NotFound { .. })
        ));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let result = EntityIndex::build(vec![
            member("Ada", "ada@example.edu", "1"),
            member("Ada L.", "ada@example.edu", "2"),
        ]);
        assert!(matches!(result, Err(LookupError::DuplicateId { .. })));
    }
}
