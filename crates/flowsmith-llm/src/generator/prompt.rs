use crate::Message;
use flowsmith_core::NodeKind;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::str::FromStr;

/// Language the prompt (and therefore the generated labels) is written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Zh => "zh",
        }
    }

    fn text(&self) -> &'static LocaleText {
        match self {
            Locale::En => &EN,
            Locale::Zh => &ZH,
        }
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "en-us" | "en-gb" | "english" => Ok(Locale::En),
            "zh" | "zh-cn" | "zh-hans" | "chinese" => Ok(Locale::Zh),
            other => Err(format!("unsupported locale '{}'", other)),
        }
    }
}

impl TryFrom<String> for Locale {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Every user-visible string of the prompt, per locale.
struct LocaleText {
    role: &'static str,
    format_intro: &'static str,
    description_label: &'static str,
    closing: &'static str,
    node_types_heading: &'static str,
    edge_props_heading: &'static str,
    requirements_heading: &'static str,
    example: ExampleLabels,
    /// Indexed like `NodeKind::ALL`.
    node_types: [&'static str; 9],
    edge_props: &'static [&'static str],
    requirements: &'static [&'static str],
}

struct ExampleLabels {
    start: (&'static str, &'static str),
    process: (&'static str, &'static str),
    decision: (&'static str, &'static str),
    end: (&'static str, &'static str),
    yes: &'static str,
    no: &'static str,
}

static EN: LocaleText = LocaleText {
    role: "You are a professional flowchart designer. Based on the user's description, generate structured flowchart data.",
    format_intro: "Return a JSON object containing `nodes` and `edges` arrays in the following format:",
    description_label: "User description: ",
    closing: "Please generate complete flowchart data based on the description.",
    node_types_heading: "Node type descriptions:",
    edge_props_heading: "Edge property descriptions:",
    requirements_heading: "Requirements:",
    example: ExampleLabels {
        start: ("Start", "Process start point"),
        process: ("Process Step", "Specific processing operation"),
        decision: ("Decision", "Branch based on condition"),
        end: ("End", "Process end point"),
        yes: "Yes",
        no: "No",
    },
    node_types: [
        "Start node (green oval)",
        "End node (red oval)",
        "Process node (blue rectangle)",
        "Decision node (yellow diamond, must have multiple outputs)",
        "Input node (purple parallelogram)",
        "Output node (purple parallelogram)",
        "Connector (small circle joining flow lines)",
        "Document node (orange special shape)",
        "Database node (indigo cylinder)",
    ],
    edge_props: &[
        "source/target: Connected node IDs",
        "label: Edge label (such as \"Yes/No\" for conditional branches)",
        "sourceHandle: Specific connection point of source node (use \"yes\"/\"no\" for decision nodes)",
        "animated: Whether to show animation effect",
    ],
    requirements: &[
        "Must have one \"start\" type start node",
        "Must have at least one \"end\" type end node",
        "Choose appropriate node types based on process characteristics",
        "Decision nodes must have at least two output edges, distinguished by sourceHandle",
        "Node positions should be reasonably distributed to avoid overlap",
        "Edges should accurately describe the flow relationship between nodes",
        "Add appropriate label descriptions for complex conditions",
        "Only return JSON data, no other text descriptions",
    ],
};

static ZH: LocaleText = LocaleText {
    role: "你是一个专业的流程图设计师。请根据用户的描述，生成结构化的流程图数据。",
    format_intro: "请返回一个包含 `nodes` 和 `edges` 数组的 JSON 对象，格式如下：",
    description_label: "用户描述：",
    closing: "请根据描述生成完整的流程图数据。",
    node_types_heading: "节点类型说明：",
    edge_props_heading: "边属性说明：",
    requirements_heading: "要求：",
    example: ExampleLabels {
        start: ("开始", "流程开始点"),
        process: ("处理步骤", "具体的处理操作"),
        decision: ("判断", "根据条件进行分支"),
        end: ("结束", "流程结束点"),
        yes: "是",
        no: "否",
    },
    node_types: [
        "开始节点（绿色椭圆）",
        "结束节点（红色椭圆）",
        "处理节点（蓝色矩形）",
        "决策节点（黄色菱形，必须有多个输出）",
        "输入节点（紫色平行四边形）",
        "输出节点（紫色平行四边形）",
        "连接器（连接流程线的小圆）",
        "文档节点（橙色特殊形状）",
        "数据库节点（靛蓝色圆柱）",
    ],
    edge_props: &[
        "source/target：连接的节点 ID",
        "label：边的标签（如条件分支的\"是/否\"）",
        "sourceHandle：源节点的具体连接点（决策节点使用 \"yes\"/\"no\"）",
        "animated：是否显示动画效果",
    ],
    requirements: &[
        "必须有一个 \"start\" 类型的开始节点",
        "必须至少有一个 \"end\" 类型的结束节点",
        "根据流程特点选择合适的节点类型",
        "决策节点必须至少有两条输出边，并用 sourceHandle 区分",
        "节点位置应合理分布，避免重叠",
        "边应准确描述节点之间的流转关系",
        "为复杂条件添加适当的标签说明",
        "只返回 JSON 数据，不要包含其他文字说明",
    ],
};

/// Build the flowchart system prompt.
///
/// When `template_override` is `Some`, uses that string as the template
/// instead of the compiled-in default.
pub(crate) fn flowchart_system_prompt(locale: Locale, template_override: Option<&str>) -> String {
    let text = locale.text();

    let example = serde_json::to_string_pretty(&example_flowchart(&text.example)).unwrap_or_default();

    let node_types = NodeKind::ALL
        .iter()
        .zip(text.node_types)
        .map(|(kind, desc)| format!("- \"{}\": {}", kind, desc))
        .collect::<Vec<_>>()
        .join("\n");

    let edge_props = text
        .edge_props
        .iter()
        .map(|line| format!("- {}", line))
        .collect::<Vec<_>>()
        .join("\n");

    let requirements = text
        .requirements
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{}. {}", i + 1, line))
        .collect::<Vec<_>>()
        .join("\n");

    let template = template_override.unwrap_or(include_str!("../../prompts/flowchart.md"));

    template
        .replace("{{role}}", text.role)
        .replace("{{format_intro}}", text.format_intro)
        .replace("{{example}}", &example)
        .replace("{{node_types_heading}}", text.node_types_heading)
        .replace("{{node_types}}", &node_types)
        .replace("{{edge_props_heading}}", text.edge_props_heading)
        .replace("{{edge_props}}", &edge_props)
        .replace("{{requirements_heading}}", text.requirements_heading)
        .replace("{{requirements}}", &requirements)
}

/// System prompt plus the user's description, ready to send.
pub(crate) fn flowchart_messages(description: &str, locale: Locale) -> Vec<Message> {
    let text = locale.text();
    vec![
        Message::system(flowchart_system_prompt(locale, None)),
        Message::user(format!(
            "{}{}\n\n{}",
            text.description_label, description, text.closing
        )),
    ]
}

fn example_flowchart(labels: &ExampleLabels) -> Value {
    let node = |id: &str, kind: NodeKind, (label, description): (&str, &str), y: u32| {
        json!({
            "id": id,
            "type": kind,
            "data": {"label": label, "description": description},
            "position": {"x": 250, "y": y}
        })
    };
    let branch = |handle: &str, label: &str| {
        json!({
            "id": format!("decision1-end-{}", handle),
            "source": "decision1",
            "target": "end",
            "type": "conditional",
            "sourceHandle": handle,
            "label": label,
            "animated": true
        })
    };

    let mut decision = node("decision1", NodeKind::Decision, labels.decision, 200);
    decision["data"]["conditions"] = json!([
        {"id": "yes", "label": labels.yes, "value": true},
        {"id": "no", "label": labels.no, "value": false}
    ]);

    json!({
        "nodes": [
            node("start", NodeKind::Start, labels.start, 0),
            node("process1", NodeKind::Process, labels.process, 100),
            decision,
            node("end", NodeKind::End, labels.end, 300)
        ],
        "edges": [
            {"id": "start-process1", "source": "start", "target": "process1", "animated": true},
            {"id": "process1-decision1", "source": "process1", "target": "decision1", "animated": true},
            branch("yes", labels.yes),
            branch("no", labels.no)
        ]
    })
}
