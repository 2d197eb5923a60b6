use crate::core::{CraftingConfig, DerivedMetrics, ResourceCost, derive_metrics};
use crate::store::SnapshotStore;

/// The closed set of mutations a caller can apply to the input record. Field
/// edits carry their target explicitly; there is no path-string dispatch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    SetResourcePrice { index: usize, value: f64 },
    SetResourceAmount { index: usize, value: f64 },
    SetArtifactPrice { value: f64 },
    SetArtifactAmount { value: f64 },
    SetFactoryPrice { value: f64 },
    SetRealizationPrice { value: f64 },
    SetInitialAmountItems { value: f64 },
    /// Select an existing preset as the active return rate.
    SelectReturnPercent { percent: f64 },
    /// Add a distinct preset in (0, 100) and select it.
    AddReturnPercent { percent: f64 },
    /// Remove a preset, clearing the selection if it was selected.
    RemoveReturnPercent { percent: f64 },
    /// Restore the built-in default record.
    Reset,
}

/// Owns the canonical input record for one logical user, together with its
/// storage slot and the latest derived values.
pub struct Session {
    config: CraftingConfig,
    metrics: DerivedMetrics,
    store: SnapshotStore,
}

impl Session {
    /// Loads prior state from the store (or the defaults) and derives the
    /// initial metrics.
    pub fn open(store: SnapshotStore) -> Self {
        let config = store.load();
        let metrics = derive_metrics(&config);
        Self {
            config,
            metrics,
            store,
        }
    }

    pub fn config(&self) -> &CraftingConfig {
        &self.config
    }

    pub fn metrics(&self) -> &DerivedMetrics {
        &self.metrics
    }

    /// Applies one mutation: validate, mutate, persist, recompute. A rejected
    /// command leaves the record, the stored snapshot, and the derived values
    /// all untouched.
    pub fn apply(&mut self, command: Command) -> Result<(), String> {
        self.mutate(command)?;
        self.store.save(&self.config);
        self.metrics = derive_metrics(&self.config);
        Ok(())
    }

    fn mutate(&mut self, command: Command) -> Result<(), String> {
        match command {
            Command::SetResourcePrice { index, value } => {
                let value = non_negative("resource price", value)?;
                self.resource_mut(index)?.price = value;
            }
            Command::SetResourceAmount { index, value } => {
                let value = non_negative("resource amount", value)?;
                self.resource_mut(index)?.amount = value;
            }
            Command::SetArtifactPrice { value } => {
                self.config.artifact.price = non_negative("artifact price", value)?;
            }
            Command::SetArtifactAmount { value } => {
                self.config.artifact.amount = non_negative("artifact amount", value)?;
            }
            Command::SetFactoryPrice { value } => {
                self.config.factory_price = non_negative("factory price", value)?;
            }
            Command::SetRealizationPrice { value } => {
                self.config.realization_price = non_negative("realization price", value)?;
            }
            Command::SetInitialAmountItems { value } => {
                self.config.initial_amount_items = non_negative("initial amount", value)?;
            }
            Command::SelectReturnPercent { percent } => {
                if !self.contains_preset(percent) {
                    return Err(format!("{percent}% is not in the preset list"));
                }
                self.config.return_percent = Some(percent);
            }
            Command::AddReturnPercent { percent } => {
                let percent = valid_percent(percent)?;
                if self.contains_preset(percent) {
                    return Err(format!("{percent}% is already in the preset list"));
                }
                let list = &mut self.config.return_percent_list;
                let at = list.iter().take_while(|entry| **entry < percent).count();
                list.insert(at, percent);
                self.config.return_percent = Some(percent);
            }
            Command::RemoveReturnPercent { percent } => {
                let list = &mut self.config.return_percent_list;
                let Some(at) = list.iter().position(|entry| *entry == percent) else {
                    return Err(format!("{percent}% is not in the preset list"));
                };
                list.remove(at);
                if self.config.return_percent == Some(percent) {
                    self.config.return_percent = None;
                }
            }
            Command::Reset => {
                self.config = CraftingConfig::default();
            }
        }
        Ok(())
    }

    fn resource_mut(&mut self, index: usize) -> Result<&mut ResourceCost, String> {
        let lines = self.config.resources.len();
        self.config
            .resources
            .get_mut(index)
            .ok_or_else(|| format!("resource index {index} is out of range (0..{lines})"))
    }

    fn contains_preset(&self, percent: f64) -> bool {
        self.config
            .return_percent_list
            .iter()
            .any(|entry| *entry == percent)
    }
}

fn non_negative(name: &str, value: f64) -> Result<f64, String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{name} must be a finite non-negative number"));
    }
    Ok(value)
}

fn valid_percent(value: f64) -> Result<f64, String> {
    if !value.is_finite() || value <= 0.0 || value >= 100.0 {
        return Err("return percent must be between 0 and 100 (exclusive)".to_string());
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DEFAULT_RETURN_PERCENT;
    use std::env;
    use std::fs;
    use std::time::SystemTime;

    fn temp_session(name: &str) -> Session {
        let unique_suffix = SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = env::temp_dir().join(format!("craftcalc_session_{name}_{unique_suffix}.json"));
        if path.exists() {
            let _ = fs::remove_file(&path);
        }
        Session::open(SnapshotStore::at(path))
    }

    fn cleanup(session: &Session) {
        let _ = fs::remove_file(session.store.path());
    }

    #[test]
    fn accepted_edit_recomputes_and_persists() {
        let mut session = temp_session("accepted_edit");

        session
            .apply(Command::SetResourcePrice {
                index: 0,
                value: 10.0,
            })
            .unwrap();
        session
            .apply(Command::SetResourceAmount {
                index: 0,
                value: 2.0,
            })
            .unwrap();
        session
            .apply(Command::SetInitialAmountItems { value: 5.0 })
            .unwrap();

        assert_eq!(session.metrics().resources_expense_per_unit, 20.0);
        assert_eq!(session.metrics().resource_totals, vec![10.0, 0.0]);

        let reloaded = Session::open(SnapshotStore::at(session.store.path().to_path_buf()));
        assert_eq!(reloaded.config(), session.config());
        assert_eq!(reloaded.metrics(), session.metrics());

        cleanup(&session);
    }

    #[test]
    fn out_of_range_resource_index_is_rejected() {
        let mut session = temp_session("bad_index");
        let before = session.config().clone();

        let result = session.apply(Command::SetResourcePrice {
            index: 2,
            value: 1.0,
        });

        assert!(result.is_err());
        assert_eq!(session.config(), &before);
        assert!(!session.store.path().exists(), "rejected edit must not persist");

        cleanup(&session);
    }

    #[test]
    fn non_finite_and_negative_values_are_rejected() {
        let mut session = temp_session("bad_values");
        let before = session.config().clone();

        for value in [-1.0, f64::NAN, f64::INFINITY] {
            assert!(session.apply(Command::SetFactoryPrice { value }).is_err());
            assert!(
                session
                    .apply(Command::SetResourceAmount { index: 0, value })
                    .is_err()
            );
        }
        assert_eq!(session.config(), &before);

        cleanup(&session);
    }

    #[test]
    fn adding_a_preset_sorts_the_list_and_selects_it() {
        let mut session = temp_session("preset_add");

        session
            .apply(Command::AddReturnPercent { percent: 50.0 })
            .unwrap();
        session
            .apply(Command::AddReturnPercent { percent: 10.0 })
            .unwrap();

        assert_eq!(
            session.config().return_percent_list,
            vec![10.0, DEFAULT_RETURN_PERCENT, 50.0]
        );
        assert_eq!(session.config().return_percent, Some(10.0));

        cleanup(&session);
    }

    #[test]
    fn duplicate_and_out_of_range_presets_leave_the_list_unchanged() {
        let mut session = temp_session("preset_bounds");
        let before = session.config().return_percent_list.clone();

        for percent in [DEFAULT_RETURN_PERCENT, 0.0, -5.0, 100.0, 130.0, f64::NAN] {
            assert!(session.apply(Command::AddReturnPercent { percent }).is_err());
        }
        assert_eq!(session.config().return_percent_list, before);

        cleanup(&session);
    }

    #[test]
    fn removing_the_selected_preset_clears_the_selection() {
        let mut session = temp_session("preset_remove_selected");

        session
            .apply(Command::RemoveReturnPercent {
                percent: DEFAULT_RETURN_PERCENT,
            })
            .unwrap();

        assert_eq!(session.config().return_percent, None);
        assert!(session.config().return_percent_list.is_empty());
        assert_eq!(
            session.metrics().finite_amount_items,
            session.config().initial_amount_items
        );

        cleanup(&session);
    }

    #[test]
    fn removing_an_unselected_preset_keeps_the_selection() {
        let mut session = temp_session("preset_remove_other");

        session
            .apply(Command::AddReturnPercent { percent: 50.0 })
            .unwrap();
        session
            .apply(Command::SelectReturnPercent {
                percent: DEFAULT_RETURN_PERCENT,
            })
            .unwrap();
        session
            .apply(Command::RemoveReturnPercent { percent: 50.0 })
            .unwrap();

        assert_eq!(session.config().return_percent, Some(DEFAULT_RETURN_PERCENT));
        assert_eq!(session.config().return_percent_list, vec![DEFAULT_RETURN_PERCENT]);

        cleanup(&session);
    }

    #[test]
    fn selecting_an_unknown_percent_is_rejected() {
        let mut session = temp_session("select_unknown");

        assert!(
            session
                .apply(Command::SelectReturnPercent { percent: 33.0 })
                .is_err()
        );
        assert_eq!(session.config().return_percent, Some(DEFAULT_RETURN_PERCENT));

        cleanup(&session);
    }

    #[test]
    fn reset_restores_the_full_default_record() {
        let mut session = temp_session("reset");

        session
            .apply(Command::SetRealizationPrice { value: 80.0 })
            .unwrap();
        session
            .apply(Command::AddReturnPercent { percent: 60.0 })
            .unwrap();
        session.apply(Command::Reset).unwrap();

        assert_eq!(session.config(), &CraftingConfig::default());

        let reloaded = Session::open(SnapshotStore::at(session.store.path().to_path_buf()));
        assert_eq!(reloaded.config(), &CraftingConfig::default());

        cleanup(&session);
    }
}
