//! Deterministic flowchart used when the model output is unusable.
//!
//! A description is classified against a prioritized keyword table; the
//! winning category's canned steps are laid out as one vertical chain between
//! a start and an end node.

use crate::{Edge, EdgeKind, FlowchartDocument, Node, NodeKind, Position};

const COLUMN_X: f64 = 250.0;
const ROW_SPACING: f64 = 120.0;

/// One canned step of a fallback category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTemplate {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: NodeKind,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Category {
    pub name: &'static str,
    /// Lowercase needles; any one of them selects the category.
    pub keywords: &'static [&'static str],
    pub steps: &'static [StepTemplate],
}

impl Category {
    fn matches(&self, haystack: &str) -> bool {
        self.keywords.iter().any(|k| haystack.contains(k))
    }
}

const fn step(name: &'static str, description: &'static str, kind: NodeKind) -> StepTemplate {
    StepTemplate {
        name,
        description,
        kind,
    }
}

/// Tested top to bottom; the first match wins.
pub static CATEGORIES: &[Category] = &[
    Category {
        name: "registration",
        keywords: &[
            "registration",
            "register",
            "login",
            "log in",
            "sign up",
            "sign in",
            "注册",
            "登录",
        ],
        steps: &[
            step(
                "Fill Information",
                "User inputs registration information",
                NodeKind::Input,
            ),
            step(
                "Validate Information",
                "System validates information validity",
                NodeKind::Process,
            ),
            step(
                "Is Information Valid?",
                "Check if information meets requirements",
                NodeKind::Decision,
            ),
            step(
                "Create Account",
                "Create new account in system",
                NodeKind::Process,
            ),
            step(
                "Send Confirmation",
                "Send registration success notification",
                NodeKind::Output,
            ),
        ],
    },
    Category {
        name: "order",
        keywords: &[
            "order",
            "purchase",
            "buy",
            "checkout",
            "e-commerce",
            "订单",
            "购买",
        ],
        steps: &[
            step(
                "Select Product",
                "User browses and selects products",
                NodeKind::Input,
            ),
            step("Add to Cart", "Add product to shopping cart", NodeKind::Process),
            step(
                "Confirm Order",
                "User confirms order information",
                NodeKind::Process,
            ),
            step(
                "Is Stock Available?",
                "Check product inventory",
                NodeKind::Decision,
            ),
            step("Process Payment", "Handle user payment", NodeKind::Process),
            step(
                "Order Complete",
                "Generate order and notify user",
                NodeKind::Output,
            ),
        ],
    },
    Category {
        name: "software",
        keywords: &[
            "development",
            "software",
            "coding",
            "programming",
            "开发",
            "软件",
        ],
        steps: &[
            step(
                "Requirements Analysis",
                "Analyze project requirements",
                NodeKind::Input,
            ),
            step(
                "Design Solution",
                "Create technical solution",
                NodeKind::Process,
            ),
            step(
                "Code Implementation",
                "Write code to implement features",
                NodeKind::Process,
            ),
            step(
                "Testing Verification",
                "Test if functionality works properly",
                NodeKind::Process,
            ),
            step(
                "Does Test Pass?",
                "Evaluate test results",
                NodeKind::Decision,
            ),
            step(
                "Deploy Online",
                "Deploy system to production environment",
                NodeKind::Output,
            ),
        ],
    },
];

pub static GENERIC: Category = Category {
    name: "generic",
    keywords: &[],
    steps: &[
        step("Input Information", "Receive input data", NodeKind::Input),
        step("Validate Data", "Verify data validity", NodeKind::Process),
        step("Process Request", "Execute business logic", NodeKind::Process),
        step("Return Result", "Output processing result", NodeKind::Output),
    ],
};

/// Pick the fallback category for a description. Matching ignores case.
pub fn classify(description: &str) -> &'static Category {
    let haystack = description.to_lowercase();
    CATEGORIES
        .iter()
        .find(|c| c.matches(&haystack))
        .unwrap_or(&GENERIC)
}

/// Build the fallback flowchart for `description`. Never fails.
pub fn generate_fallback(description: &str) -> FlowchartDocument {
    build_chain(classify(description).steps)
}

fn build_chain(steps: &[StepTemplate]) -> FlowchartDocument {
    let row = |i: usize| Position {
        x: COLUMN_X,
        y: i as f64 * ROW_SPACING,
    };

    let mut nodes = Vec::with_capacity(steps.len() + 2);
    nodes.push(Node::new("start", NodeKind::Start, "Start", row(0)).with_description("Process start"));
    for (i, step) in steps.iter().enumerate() {
        nodes.push(
            Node::new(format!("step{}", i + 1), step.kind, step.name, row(i + 1))
                .with_description(step.description),
        );
    }
    nodes.push(
        Node::new("end", NodeKind::End, "End", row(steps.len() + 1)).with_description("Process end"),
    );

    let edges = nodes
        .windows(2)
        .map(|pair| Edge {
            kind: Some(EdgeKind::Default),
            animated: true,
            ..Edge::between(pair[0].id.as_str(), pair[1].id.as_str())
        })
        .collect();

    FlowchartDocument {
        nodes,
        edges,
        metadata: None,
    }
}
