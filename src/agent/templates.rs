use crate::config::TemplatesConfig;

/// 兜底模板中用户原文的占位符
pub const MESSAGE_PLACEHOLDER: &str = "{message}";

/// 一个关键词分类：任一关键词（忽略大小写、子串匹配）命中即返回该模板
#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    keywords: Vec<String>,
    response: String,
}

impl Category {
    pub fn new(name: impl Into<String>, keywords: &[&str], response: impl Into<String>) -> Self {
        Category {
            name: name.into(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            response: response.into(),
        }
    }

    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }
}

/// 离线模板选择器，按顺序匹配，先命中者优先
#[derive(Debug, Clone)]
pub struct TemplateSelector {
    categories: Vec<Category>,
    default_response: String,
}

impl TemplateSelector {
    pub fn new(categories: Vec<Category>, default_response: impl Into<String>) -> Self {
        TemplateSelector {
            categories,
            default_response: default_response.into(),
        }
    }

    /// 内置的分类表
    pub fn builtin() -> Self {
        Self::new(
            vec![
                Category::new("computer_science", &["computer science", "cs", "programming"], COMPUTER_SCIENCE),
                Category::new("electronics", &["electronics", "ec", "circuit"], ELECTRONICS),
                Category::new("electrical", &["electrical", "ee", "power"], ELECTRICAL),
                Category::new("mechanical", &["mechanical", "me", "thermodynamics"], MECHANICAL),
                Category::new("formulas", &["formula", "equation"], FORMULAS),
                Category::new("strategy", &["help", "guide", "strategy"], STRATEGY),
                Category::new("greeting", &["hello", "hi", "start"], GREETING),
            ],
            DEFAULT_RESPONSE,
        )
    }

    /// 配置中有分类表时使用配置，否则使用内置表
    pub fn from_config(config: &TemplatesConfig) -> Self {
        let builtin = Self::builtin();

        let categories = if config.categories.is_empty() {
            builtin.categories
        } else {
            config
                .categories
                .iter()
                .map(|c| Category {
                    name: c.name.clone(),
                    keywords: c.keywords.iter().map(|k| k.to_lowercase()).collect(),
                    response: c.response.clone(),
                })
                .collect()
        };

        let default_response = config
            .default_response
            .clone()
            .unwrap_or(builtin.default_response);

        Self::new(categories, default_response)
    }

    /// 返回命中的分类，None 表示走兜底模板
    pub fn classify(&self, message: &str) -> Option<&Category> {
        let lowered = message.to_lowercase();
        self.categories.iter().find(|c| c.matches(&lowered))
    }

    pub fn select(&self, message: &str) -> String {
        match self.classify(message) {
            Some(category) => category.response.clone(),
            None => self.default_response.replace(MESSAGE_PLACEHOLDER, message),
        }
    }
}

impl Default for TemplateSelector {
    fn default() -> Self {
        Self::builtin()
    }
}

const COMPUTER_SCIENCE: &str = "**Computer Science GATE Preparation Tips:**

🔹 **Core Topics to Focus:**
• Data Structures & Algorithms
• Operating Systems
• Computer Networks
• Database Management
• Computer Organization

🔹 **Important Formulas:**
• Time Complexity Analysis
• Memory Management
• Network Protocols

🔹 **Study Strategy:**
1. Solve previous year questions
2. Practice coding problems daily
3. Focus on core concepts
4. Take mock tests regularly

💡 **Tip:** Start with Data Structures as it's the foundation for most CS topics!";

const ELECTRONICS: &str = "**Electronics GATE Preparation Guide:**

🔹 **Key Topics:**
• Electronic Devices & Circuits
• Digital Electronics
• Communication Systems
• Control Systems
• Signals & Systems

🔹 **Important Formulas:**
• Ohm's Law: V = IR
• Power: P = VI
• Frequency: f = 1/T
• Gain: Av = Vout/Vin

🔹 **Study Plan:**
1. Master basic circuit analysis
2. Practice numerical problems
3. Understand device characteristics
4. Focus on digital logic design

💡 **Tip:** Practice circuit analysis problems daily!";

const ELECTRICAL: &str = "**Electrical Engineering GATE Tips:**

🔹 **Core Subjects:**
• Power Systems
• Electrical Machines
• Control Systems
• Power Electronics
• Electrical Measurements

🔹 **Key Formulas:**
• Power: P = √3 × VL × IL × cos(φ)
• Efficiency: η = (Output/Input) × 100%
• Voltage Regulation: VR = (Vnl - Vfl)/Vfl × 100%

🔹 **Preparation Strategy:**
1. Focus on power system analysis
2. Practice machine problems
3. Understand control theory
4. Master electrical measurements

💡 **Tip:** Power systems carry maximum weightage!";

const MECHANICAL: &str = "**Mechanical Engineering GATE Strategy:**

🔹 **Important Topics:**
• Thermodynamics
• Fluid Mechanics
• Strength of Materials
• Machine Design
• Manufacturing Processes

🔹 **Essential Formulas:**
• First Law: ΔU = Q - W
• Efficiency: η = Wnet/Qin
• Stress: σ = F/A
• Strain: ε = ΔL/L

🔹 **Study Approach:**
1. Master thermodynamics cycles
2. Practice fluid mechanics problems
3. Understand material properties
4. Focus on design principles

💡 **Tip:** Thermodynamics and fluid mechanics are scoring subjects!";

const FORMULAS: &str = "**Common GATE Formulas by Subject:**

🔹 **Computer Science:**
• Time Complexity: O(n), O(n²), O(log n)
• Memory: 1 KB = 1024 bytes
• Network: Bandwidth × Delay = Data

🔹 **Electronics:**
• V = IR (Ohm's Law)
• P = VI (Power)
• f = 1/T (Frequency)

🔹 **Electrical:**
• P = √3 × VL × IL × cos(φ)
• η = (Output/Input) × 100%

🔹 **Mechanical:**
• ΔU = Q - W (First Law)
• σ = F/A (Stress)
• ε = ΔL/L (Strain)

💡 **Tip:** Create a formula sheet for quick revision!";

const STRATEGY: &str = "**GATE/NET Exam Preparation Strategy:**

🎯 **3-Month Study Plan:**

**Month 1: Foundation**
• Revise core subjects
• Solve basic problems
• Create formula sheets

**Month 2: Advanced Topics**
• Practice previous year questions
• Take subject-wise tests
• Focus on weak areas

**Month 3: Mock Tests**
• Daily mock tests
• Time management practice
• Final revision

📚 **Study Resources:**
• Previous year papers
• Standard textbooks
• Online mock tests
• Video lectures

⏰ **Time Management:**
• 2-3 hours daily study
• Weekend mock tests
• Regular revision

💡 **Success Tip:** Consistency is key! Study daily rather than cramming.";

const GREETING: &str = "🤖 **Welcome to GATE/NET Exam Assistant!**

I'm here to help you prepare for your GATE and NET engineering exams. I can assist with:

📚 **Subject Help:**
• Computer Science, Electronics, Electrical, Mechanical
• Problem-solving techniques
• Important formulas and concepts

📖 **Study Guidance:**
• Preparation strategies
• Time management tips
• Mock test preparation

💡 **Try asking:**
• \"Help me with Computer Science topics\"
• \"What are important formulas for Electronics?\"
• \"Give me study strategy for GATE\"
• \"Explain thermodynamics concepts\"

Let's ace your exam together! 🎯✨";

const DEFAULT_RESPONSE: &str = "I understand you're asking about: \"{message}\"

For GATE/NET exam preparation, I can help you with:

🔹 **Subject-specific guidance** (CS, EC, EE, ME, CE, etc.)
🔹 **Problem-solving techniques**
🔹 **Important formulas and concepts**
🔹 **Study strategies and tips**
🔹 **Mock test preparation**

Try asking about specific subjects like:
• \"Help with Computer Science topics\"
• \"Electronics formulas\"
• \"Mechanical engineering concepts\"
• \"Study strategy for GATE\"

Or ask for general guidance:
• \"How to prepare for GATE?\"
• \"Important topics for NET exam\"
• \"Time management tips\"

What specific topic would you like help with? 📚";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CategoryConfig;

    fn category_of(selector: &TemplateSelector, message: &str) -> Option<String> {
        selector.classify(message).map(|c| c.name.clone())
    }

    #[test]
    fn test_first_match_wins() {
        let selector = TemplateSelector::builtin();
        assert_eq!(
            category_of(&selector, "Programming questions about a circuit simulator").as_deref(),
            Some("computer_science")
        );
        assert_eq!(
            selector.select("programming and circuit"),
            COMPUTER_SCIENCE
        );
    }

    #[test]
    fn test_categories_by_keyword() {
        let selector = TemplateSelector::builtin();
        assert_eq!(category_of(&selector, "CIRCUIT analysis").as_deref(), Some("electronics"));
        assert_eq!(category_of(&selector, "power systems").as_deref(), Some("electrical"));
        assert_eq!(category_of(&selector, "machine theory for me").as_deref(), Some("mechanical"));
        assert_eq!(category_of(&selector, "any good formula?").as_deref(), Some("formulas"));
        assert_eq!(category_of(&selector, "hello").as_deref(), Some("greeting"));
    }

    #[test]
    fn test_default_interpolates_message() {
        let selector = TemplateSelector::builtin();
        let message = "xyz qqq";
        assert!(selector.classify(message).is_none());
        assert!(selector
            .select(message)
            .starts_with("I understand you're asking about: \"xyz qqq\""));
    }

    #[test]
    fn test_selection_is_deterministic() {
        let selector = TemplateSelector::builtin();
        let first = selector.select("zzz");
        for _ in 0..5 {
            assert_eq!(selector.select("zzz"), first);
        }
    }

    #[test]
    fn test_table_from_config() {
        let config = TemplatesConfig {
            categories: vec![CategoryConfig {
                name: "maths".to_string(),
                keywords: vec!["Calculus".to_string()],
                response: "Integrate daily.".to_string(),
            }],
            default_response: Some("No idea about {message}".to_string()),
        };
        let selector = TemplateSelector::from_config(&config);

        assert_eq!(selector.select("calculus tips"), "Integrate daily.");
        assert_eq!(selector.select("programming"), "No idea about programming");
    }

    #[test]
    fn test_empty_config_uses_builtin() {
        let selector = TemplateSelector::from_config(&TemplatesConfig::default());
        assert_eq!(selector.select("hello"), GREETING);
    }
}
