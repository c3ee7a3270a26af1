//! 机器学习术语表
//!
//! 术语翻译随系统指令一起下发，保证多批次之间译名一致。

use phf::phf_map;

/// 常用机器学习术语（英文 → 中文）
pub static ML_TERMINOLOGY: phf::Map<&'static str, &'static str> = phf_map! {
    "machine learning" => "机器学习",
    "deep learning" => "深度学习",
    "neural network" => "神经网络",
    "gradient descent" => "梯度下降",
    "loss function" => "损失函数",
    "overfitting" => "过拟合",
    "underfitting" => "欠拟合",
    "regularization" => "正则化",
    "backpropagation" => "反向传播",
    "convolutional neural network" => "卷积神经网络",
    "recurrent neural network" => "循环神经网络",
    "attention mechanism" => "注意力机制",
    "transformer" => "Transformer",
    "supervised learning" => "监督学习",
    "unsupervised learning" => "无监督学习",
    "reinforcement learning" => "强化学习",
    "classification" => "分类",
    "regression" => "回归",
    "clustering" => "聚类",
    "feature extraction" => "特征提取",
    "hyperparameter" => "超参数",
    "batch normalization" => "批归一化",
    "dropout" => "Dropout",
    "epoch" => "轮次",
    "learning rate" => "学习率",
    "activation function" => "激活函数",
    "cross-entropy" => "交叉熵",
    "softmax" => "Softmax",
    "embedding" => "嵌入",
    "generative adversarial network" => "生成对抗网络",
};

/// 生成系统指令里的术语表段落（按英文术语排序，保证提示词稳定）
pub fn glossary_section() -> String {
    let mut entries: Vec<(&str, &str)> = ML_TERMINOLOGY
        .entries()
        .map(|(k, v)| (*k, *v))
        .collect();
    entries.sort_by_key(|(k, _)| *k);

    let mut section = String::from("\n\nTERMINOLOGY (use these translations consistently):\n");
    for (en, zh) in entries {
        section.push_str(&format!("- {} -> {}\n", en, zh));
    }
    section
}
