//! Menu projection: effective permissions → Application → Module → Option tree.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use warden_core::{ApplicationId, ModuleId, OptionId};

use crate::catalog::{Application, MenuOption, Module};
use crate::effective::chain_is_active;
use crate::permissions::ActionCode;
use crate::resolve::{EffectivePermission, EffectivePermissions};

/// Navigation tree for one application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuTree {
    pub application_code: String,
    pub application_name: String,
    pub application_url: String,
    pub application_icon: String,
    pub modules: Vec<ModuleNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleNode {
    pub module_id: ModuleId,
    pub code: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub order: i32,
    pub options: Vec<OptionNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionNode {
    pub option_id: OptionId,
    pub code: String,
    pub name: String,
    pub route: String,
    pub http_method: String,
    pub icon: String,
    pub allowed_actions: Vec<ActionCode>,
}

impl OptionNode {
    pub fn allows(&self, action: &ActionCode) -> bool {
        self.allowed_actions.contains(action)
    }
}

/// Menu for the application whose code matches `application_code`
/// (case-insensitive). `None` when nothing survives pruning.
pub fn project_menu(permissions: &EffectivePermissions, application_code: &str) -> Option<MenuTree> {
    let grants: Vec<&EffectivePermission> = permissions
        .iter()
        .filter(|grant| grant.record.application.matches_code(application_code))
        .collect();
    let application = &grants.first()?.record.application;
    build_tree(application, &grants)
}

/// One menu per application, in encounter order; empty trees are omitted.
pub fn project_all_menus(permissions: &EffectivePermissions) -> Vec<MenuTree> {
    let mut buckets: Vec<(&Application, Vec<&EffectivePermission>)> = Vec::new();
    let mut index: HashMap<ApplicationId, usize> = HashMap::new();
    for grant in permissions.iter() {
        let application = &grant.record.application;
        let idx = *index.entry(application.id).or_insert_with(|| {
            buckets.push((application, Vec::new()));
            buckets.len() - 1
        });
        buckets[idx].1.push(grant);
    }

    buckets
        .into_iter()
        .filter_map(|(application, grants)| build_tree(application, &grants))
        .collect()
}

type OptionSlot<'a> = (&'a MenuOption, Vec<ActionCode>);

fn build_tree(application: &Application, grants: &[&EffectivePermission]) -> Option<MenuTree> {
    // (module, [(option, actions)]) in encounter order, with id → position indexes.
    let mut modules: Vec<(&Module, Vec<OptionSlot<'_>>)> = Vec::new();
    let mut module_index: HashMap<ModuleId, usize> = HashMap::new();
    let mut option_index: HashMap<OptionId, (usize, usize)> = HashMap::new();

    for grant in grants {
        let record = &grant.record;
        let module_idx = *module_index.entry(record.module.id).or_insert_with(|| {
            modules.push((&record.module, Vec::new()));
            modules.len() - 1
        });
        let (module_idx, option_idx) = *option_index.entry(record.option.id).or_insert_with(|| {
            let options = &mut modules[module_idx].1;
            options.push((&record.option, Vec::new()));
            (module_idx, options.len() - 1)
        });
        let actions = &mut modules[module_idx].1[option_idx].1;

        if chain_is_active(record) && !actions.contains(&record.permission.action) {
            actions.push(record.permission.action.clone());
        }
    }

    let mut nodes: Vec<ModuleNode> = modules
        .into_iter()
        .filter_map(|(module, options)| {
            let options: Vec<OptionNode> = options
                .into_iter()
                .filter(|(_, actions)| !actions.is_empty())
                .map(|(option, allowed_actions)| OptionNode {
                    option_id: option.id,
                    code: option.code.clone(),
                    name: option.name.clone(),
                    route: option.route.clone(),
                    http_method: option.http_method.clone(),
                    icon: option.icon.clone(),
                    allowed_actions,
                })
                .collect();
            (!options.is_empty()).then(|| ModuleNode {
                module_id: module.id,
                code: module.code.clone(),
                name: module.name.clone(),
                description: module.description.clone(),
                icon: module.icon.clone(),
                order: module.order,
                options,
            })
        })
        .collect();

    if nodes.is_empty() {
        return None;
    }
    // Stable: equal `order` keeps encounter order.
    nodes.sort_by_key(|module| module.order);

    Some(MenuTree {
        application_code: application.code.clone(),
        application_name: application.name.clone(),
        application_url: application.base_url.clone(),
        application_icon: application.icon.clone(),
        modules: nodes,
    })
}
