use crate::condition::AttributePath;
use crate::types::AttributeValue;

/// Right-hand side of a single SET action before it is resolved against the
/// document being updated. Paths resolve against the *input* item, not the
/// in-progress copy other actions in the same expression may have produced.
#[derive(Debug, Clone)]
pub enum Operand {
    Value(AttributeValue),
    Path(AttributePath),
}

impl<T: Into<AttributeValue>> From<T> for Operand {
    fn from(value: T) -> Self {
        Operand::Value(value.into())
    }
}

impl Operand {
    pub fn path(path: impl Into<AttributePath>) -> Self {
        Operand::Path(path.into())
    }
}

#[derive(Debug, Clone)]
pub enum SetValue {
    Operand(Operand),
    Add(Operand, Operand),
    Subtract(Operand, Operand),
    IfNotExists(AttributePath, Operand),
    ListAppend(Operand, Operand),
}

impl SetValue {
    pub fn value(value: impl Into<AttributeValue>) -> Self {
        SetValue::Operand(Operand::Value(value.into()))
    }

    pub fn path(path: impl Into<AttributePath>) -> Self {
        SetValue::Operand(Operand::Path(path.into()))
    }

    pub fn add(a: impl Into<Operand>, b: impl Into<Operand>) -> Self {
        SetValue::Add(a.into(), b.into())
    }

    pub fn subtract(a: impl Into<Operand>, b: impl Into<Operand>) -> Self {
        SetValue::Subtract(a.into(), b.into())
    }

    pub fn if_not_exists(path: impl Into<AttributePath>, fallback: impl Into<Operand>) -> Self {
        SetValue::IfNotExists(path.into(), fallback.into())
    }

    pub fn list_append(a: impl Into<Operand>, b: impl Into<Operand>) -> Self {
        SetValue::ListAppend(a.into(), b.into())
    }
}

impl<T: Into<AttributeValue>> From<T> for SetValue {
    fn from(value: T) -> Self {
        SetValue::value(value)
    }
}

#[derive(Debug, Clone)]
pub enum UpdateAction {
    Set {
        path: AttributePath,
        value: SetValue,
    },
    Remove {
        path: AttributePath,
    },
    Add {
        path: AttributePath,
        value: AttributeValue,
    },
    Delete {
        path: AttributePath,
        value: AttributeValue,
    },
}

#[derive(Debug, Default, Clone)]
pub struct UpdateExpression {
    actions: Vec<UpdateAction>,
}

impl UpdateExpression {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    pub fn set(mut self, path: impl Into<AttributePath>, value: impl Into<SetValue>) -> Self {
        self.actions.push(UpdateAction::Set {
            path: path.into(),
            value: value.into(),
        });
        self
    }

    pub fn set_if_not_exists(
        mut self,
        path: impl Into<AttributePath>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        let path = path.into();
        self.actions.push(UpdateAction::Set {
            path: path.clone(),
            value: SetValue::IfNotExists(path, Operand::Value(value.into())),
        });
        self
    }

    pub fn remove(mut self, path: impl Into<AttributePath>) -> Self {
        self.actions
            .push(UpdateAction::Remove { path: path.into() });
        self
    }

    pub fn add(mut self, path: impl Into<AttributePath>, value: impl Into<AttributeValue>) -> Self {
        self.actions.push(UpdateAction::Add {
            path: path.into(),
            value: value.into(),
        });
        self
    }

    pub fn delete(
        mut self,
        path: impl Into<AttributePath>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.actions.push(UpdateAction::Delete {
            path: path.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_action(mut self, action: UpdateAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn actions(&self) -> &[UpdateAction] {
        &self.actions
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Top-level attribute names touched by this expression, for UPDATED_OLD/UPDATED_NEW
    /// return-value filtering.
    pub fn touched_roots(&self) -> Vec<&str> {
        self.actions
            .iter()
            .filter_map(|action| match action {
                UpdateAction::Set { path, .. }
                | UpdateAction::Remove { path }
                | UpdateAction::Add { path, .. }
                | UpdateAction::Delete { path, .. } => path.root(),
            })
            .collect()
    }

    fn path_of(action: &UpdateAction) -> &AttributePath {
        match action {
            UpdateAction::Set { path, .. }
            | UpdateAction::Remove { path }
            | UpdateAction::Add { path, .. }
            | UpdateAction::Delete { path, .. } => path,
        }
    }

    fn clause_of(action: &UpdateAction) -> &'static str {
        match action {
            UpdateAction::Set { .. } => "SET",
            UpdateAction::Remove { .. } => "REMOVE",
            UpdateAction::Add { .. } => "ADD",
            UpdateAction::Delete { .. } => "DELETE",
        }
    }

    /// Rejects paths that overlap (one a prefix of the other) across
    /// different clauses. Duplicates within the same clause are allowed.
    pub fn validate_no_cross_clause_overlap(&self) -> Result<(), String> {
        for (i, a) in self.actions.iter().enumerate() {
            for b in self.actions.iter().skip(i + 1) {
                if Self::clause_of(a) == Self::clause_of(b) {
                    continue;
                }
                if Self::path_of(a).overlaps(Self::path_of(b)) {
                    return Err(format!(
                        "{:?} ({}) overlaps {:?} ({})",
                        Self::path_of(a),
                        Self::clause_of(a),
                        Self::path_of(b),
                        Self::clause_of(b)
                    ));
                }
            }
        }
        Ok(())
    }
}
