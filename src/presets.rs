//! Built-in launch definitions for well-known MCP servers, used by `add --preset`.

use crate::model::LaunchDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub display_name: &'static str,
    pub command: &'static str,
    pub args: &'static [&'static str],
    pub description: &'static str,
}

impl Preset {
    pub fn definition(&self) -> LaunchDefinition {
        LaunchDefinition::new(
            self.command,
            self.args.iter().map(|a| a.to_string()).collect(),
        )
    }
}

pub const PRESETS: &[Preset] = &[
    Preset {
        name: "context7",
        display_name: "Context7 MCP",
        command: "npx",
        args: &["context7-mcp"],
        description: "Official library documentation lookup",
    },
    Preset {
        name: "sequential-thinking",
        display_name: "Sequential Thinking MCP",
        command: "npx",
        args: &["sequential-thinking-mcp"],
        description: "Multi-step reasoning and analysis",
    },
    Preset {
        name: "arxiv",
        display_name: "ArXiv MCP",
        command: "npx",
        args: &["arxiv-mcp-server"],
        description: "Search and download academic papers",
    },
    Preset {
        name: "playwright",
        display_name: "Playwright MCP",
        command: "npx",
        args: &["playwright-mcp"],
        description: "Browser automation and testing",
    },
    Preset {
        name: "serena",
        display_name: "Serena MCP",
        command: "npx",
        args: &["serena-mcp"],
        description: "Semantic code understanding",
    },
    Preset {
        name: "youtube",
        display_name: "YouTube MCP",
        command: "npx",
        args: &["youtube-mcp"],
        description: "YouTube content access",
    },
    Preset {
        name: "notion",
        display_name: "Notion MCP",
        command: "npx",
        args: &["notion-mcp"],
        description: "Notion workspace integration",
    },
    Preset {
        name: "chrome-tabs",
        display_name: "Chrome Tabs MCP",
        command: "npx",
        args: &["chrome-tabs-mcp"],
        description: "Browser tab access and control",
    },
];

pub fn find(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}
