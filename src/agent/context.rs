use crate::types::{Message, Turn};

/// 上下文 - 系统提示 + 历史对话 + 本次提问，组装成补全请求的消息列表
pub struct Context {
    system_prompt: String,
    messages: Vec<Message>,
}

impl Context {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Context {
            system_prompt: system_prompt.into(),
            messages: Vec::new(),
        }
    }

    /// 用已有的对话历史初始化
    pub fn with_history(system_prompt: impl Into<String>, history: &[Turn]) -> Self {
        let mut context = Self::new(system_prompt);
        context.messages.extend(history.iter().map(Message::from));
        context
    }

    /// 添加用户消息
    pub fn add_user(&mut self, content: &str) {
        self.messages.push(Message::from(&Turn::user(content)));
    }

    /// 获取所有消息（包含系统提示）
    pub fn messages(&self) -> Vec<Message> {
        let mut all = Vec::with_capacity(self.messages.len() + 1);
        all.push(Message::system(self.system_prompt.clone()));
        all.extend(self.messages.iter().cloned());
        all
    }

    /// 消息数量（不含系统提示）
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_comes_first() {
        let history = vec![Turn::user("hi"), Turn::assistant("hello")];
        let mut context = Context::with_history("be brief", &history);
        context.add_user("what is a stack?");

        let messages = context.messages();
        let roles: Vec<&str> = messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "user"]);
        assert_eq!(messages[0].content, "be brief");
        assert_eq!(messages[3].content, "what is a stack?");
        assert_eq!(context.len(), 3);
    }

    #[test]
    fn test_empty_history() {
        let context = Context::new("sys");
        assert!(context.is_empty());
        assert_eq!(context.messages().len(), 1);
    }
}
