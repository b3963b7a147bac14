//! Common source documents for tests.

// BPMN

/// Three flow nodes and two sequence flows, nothing else.
pub const BPMN_MINIMAL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<definitions xmlns="http://www.omg.org/spec/BPMN/20100524/MODEL" id="defs">
  <process id="proc">
    <startEvent id="start" name="Order received"/>
    <task id="task" name="Check order"/>
    <endEvent id="end"/>
    <sequenceFlow id="f1" sourceRef="start" targetRef="task"/>
    <sequenceFlow id="f2" sourceRef="task" targetRef="end"/>
  </process>
</definitions>
"#;

/// A pool with one lane, a diagram, and a boundary event.
pub const BPMN_ORDER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<bpmn:definitions xmlns:bpmn="http://www.omg.org/spec/BPMN/20100524/MODEL"
                  xmlns:bpmndi="http://www.omg.org/spec/BPMN/20100524/DI"
                  xmlns:dc="http://www.omg.org/spec/DD/20100524/DC"
                  xmlns:di="http://www.omg.org/spec/DD/20100524/DI"
                  id="defs" name="Order handling" exporter="Camunda Modeler" exporterVersion="5.20.0">
  <bpmn:collaboration id="collab">
    <bpmn:participant id="pool" name="Shop" processRef="proc"/>
  </bpmn:collaboration>
  <bpmn:process id="proc" isExecutable="false">
    <bpmn:laneSet id="ls">
      <bpmn:lane id="lane_sales" name="Sales">
        <bpmn:flowNodeRef>start</bpmn:flowNodeRef>
        <bpmn:flowNodeRef>task</bpmn:flowNodeRef>
      </bpmn:lane>
    </bpmn:laneSet>
    <bpmn:startEvent id="start" name="Order received"/>
    <bpmn:task id="task" name="Check order">
      <bpmn:documentation>Verify stock
and payment</bpmn:documentation>
    </bpmn:task>
    <bpmn:boundaryEvent id="timeout" name="Timeout" attachedToRef="task">
      <bpmn:timerEventDefinition><bpmn:timeDuration>PT2H</bpmn:timeDuration></bpmn:timerEventDefinition>
    </bpmn:boundaryEvent>
    <bpmn:endEvent id="end"/>
    <bpmn:sequenceFlow id="f1" sourceRef="start" targetRef="task"/>
    <bpmn:sequenceFlow id="f2" sourceRef="task" targetRef="end"/>
    <bpmn:sequenceFlow id="f3" sourceRef="task" targetRef="archive"/>
  </bpmn:process>
  <bpmndi:BPMNDiagram id="diagram" name="Order flow">
    <bpmndi:BPMNPlane id="plane" bpmnElement="collab">
      <bpmndi:BPMNShape id="pool_di" bpmnElement="pool" isHorizontal="true"><dc:Bounds x="50" y="40" width="500" height="200"/></bpmndi:BPMNShape>
      <bpmndi:BPMNShape id="start_di" bpmnElement="start"><dc:Bounds x="100" y="100" width="36" height="36"/></bpmndi:BPMNShape>
      <bpmndi:BPMNShape id="task_di" bpmnElement="task"><dc:Bounds x="200" y="80" width="100" height="80"/></bpmndi:BPMNShape>
      <bpmndi:BPMNShape id="end_di" bpmnElement="end"><dc:Bounds x="360" y="100" width="36" height="36"/></bpmndi:BPMNShape>
      <bpmndi:BPMNEdge id="f1_di" bpmnElement="f1"><di:waypoint x="136" y="118"/><di:waypoint x="200" y="120"/></bpmndi:BPMNEdge>
      <bpmndi:BPMNEdge id="f2_di" bpmnElement="f2"><di:waypoint x="300" y="120"/><di:waypoint x="360" y="118"/></bpmndi:BPMNEdge>
    </bpmndi:BPMNPlane>
  </bpmndi:BPMNDiagram>
</bpmn:definitions>
"#;

// ARCHIMATE EXCHANGE

pub const MEFF_BANK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<model xmlns="http://www.opengroup.org/xsd/archimate/3.0/"
       xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" identifier="bank">
  <name xml:lang="en">Bank</name>
  <documentation>Retail banking landscape</documentation>
  <elements>
    <element identifier="a" xsi:type="BusinessActor">
      <name xml:lang="en">Customer</name>
      <properties><property propertyDefinitionRef="pd1"><value>High</value></property></properties>
    </element>
    <element identifier="b" xsi:type="BusinessRole"><name>Client</name></element>
    <element identifier="c" xsi:type="BusinessObject"><name>Account</name></element>
    <element identifier="x" xsi:type="TotallyMadeUp"><name>Mystery</name></element>
  </elements>
  <relationships>
    <relationship identifier="r1" source="a" target="b" xsi:type="Assignment"/>
    <relationship identifier="r2" source="b" target="c" xsi:type="Access" accessType="Read"/>
  </relationships>
  <organizations>
    <item><label xml:lang="en">Business</label>
      <item identifierRef="a"/>
      <item identifierRef="b"/>
      <item identifierRef="c"/>
    </item>
    <item><label xml:lang="en">Views</label>
      <item identifierRef="v1"/>
    </item>
  </organizations>
  <propertyDefinitions>
    <propertyDefinition identifier="pd1" type="string"><name>Priority</name></propertyDefinition>
  </propertyDefinitions>
  <views>
    <diagrams>
      <view identifier="v1" xsi:type="Diagram" viewpoint="Layered">
        <name xml:lang="en">Overview</name>
        <node identifier="g1" xsi:type="Container" x="0" y="0" w="400" h="300">
          <label xml:lang="en">Customers</label>
          <node identifier="n1" elementRef="a" xsi:type="Element" x="10" y="40" w="120" h="55"/>
        </node>
        <node identifier="n2" elementRef="b" xsi:type="Element" x="200" y="40" w="120" h="55"/>
        <node identifier="n3" elementRef="c" xsi:type="Element" x="200" y="140" w="120" h="55"/>
        <connection identifier="c1" relationshipRef="r1" xsi:type="Relationship" source="n1" target="n2">
          <bendpoint x="150" y="70"/>
        </connection>
        <connection identifier="c2" xsi:type="Relationship" source="n3" target="n2"/>
      </view>
    </diagrams>
  </views>
</model>
"#;

/// [`MEFF_BANK`] with every element tag under an `ns0:` prefix.
pub const MEFF_BANK_NS0: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ns0:model xmlns:ns0="http://www.opengroup.org/xsd/archimate/3.0/"
           xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" identifier="bank">
  <ns0:name xml:lang="en">Bank</ns0:name>
  <ns0:documentation>Retail banking landscape</ns0:documentation>
  <ns0:elements>
    <ns0:element identifier="a" xsi:type="BusinessActor">
      <ns0:name xml:lang="en">Customer</ns0:name>
      <ns0:properties><ns0:property propertyDefinitionRef="pd1"><ns0:value>High</ns0:value></ns0:property></ns0:properties>
    </ns0:element>
    <ns0:element identifier="b" xsi:type="BusinessRole"><ns0:name>Client</ns0:name></ns0:element>
    <ns0:element identifier="c" xsi:type="BusinessObject"><ns0:name>Account</ns0:name></ns0:element>
    <ns0:element identifier="x" xsi:type="TotallyMadeUp"><ns0:name>Mystery</ns0:name></ns0:element>
  </ns0:elements>
  <ns0:relationships>
    <ns0:relationship identifier="r1" source="a" target="b" xsi:type="Assignment"/>
    <ns0:relationship identifier="r2" source="b" target="c" xsi:type="Access" accessType="Read"/>
  </ns0:relationships>
  <ns0:organizations>
    <ns0:item><ns0:label xml:lang="en">Business</ns0:label>
      <ns0:item identifierRef="a"/>
      <ns0:item identifierRef="b"/>
      <ns0:item identifierRef="c"/>
    </ns0:item>
    <ns0:item><ns0:label xml:lang="en">Views</ns0:label>
      <ns0:item identifierRef="v1"/>
    </ns0:item>
  </ns0:organizations>
  <ns0:propertyDefinitions>
    <ns0:propertyDefinition identifier="pd1" type="string"><ns0:name>Priority</ns0:name></ns0:propertyDefinition>
  </ns0:propertyDefinitions>
  <ns0:views>
    <ns0:diagrams>
      <ns0:view identifier="v1" xsi:type="Diagram" viewpoint="Layered">
        <ns0:name xml:lang="en">Overview</ns0:name>
        <ns0:node identifier="g1" xsi:type="Container" x="0" y="0" w="400" h="300">
          <ns0:label xml:lang="en">Customers</ns0:label>
          <ns0:node identifier="n1" elementRef="a" xsi:type="Element" x="10" y="40" w="120" h="55"/>
        </ns0:node>
        <ns0:node identifier="n2" elementRef="b" xsi:type="Element" x="200" y="40" w="120" h="55"/>
        <ns0:node identifier="n3" elementRef="c" xsi:type="Element" x="200" y="140" w="120" h="55"/>
        <ns0:connection identifier="c1" relationshipRef="r1" xsi:type="Relationship" source="n1" target="n2">
          <ns0:bendpoint x="150" y="70"/>
        </ns0:connection>
        <ns0:connection identifier="c2" xsi:type="Relationship" source="n3" target="n2"/>
      </ns0:view>
    </ns0:diagrams>
  </ns0:views>
</ns0:model>
"#;

/// An ArchiMate 2.1 export using the legacy vocabulary and layout.
pub const MEFF_LEGACY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<model xmlns="http://www.opengroup.org/xsd/archimate"
       xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" identifier="legacy">
  <name>Legacy</name>
  <elements>
    <element identifier="s" xsi:type="InfrastructureService"><label>Hosting</label></element>
    <element identifier="app" xsi:type="ApplicationComponent"><label>CRM</label></element>
    <element identifier="j" xsi:type="OrJunction"/>
  </elements>
  <relationships>
    <relationship identifier="u" source="s" target="app" xsi:type="UsedByRelationship"/>
  </relationships>
  <views>
    <view identifier="v" viewpoint="Technology Usage">
      <label>Hosting</label>
      <node identifier="ns" elementref="s" x="0" y="0" w="120" h="55"/>
      <node identifier="na" elementref="app" x="0" y="100" w="120" h="55"/>
      <connection identifier="cu" relationshipref="u" source="ns" target="na"/>
    </view>
  </views>
</model>
"#;

// ENTERPRISE ARCHITECT XMI

pub const EA_XMI_ORDERS: &str = r##"<?xml version="1.0" encoding="windows-1252"?>
<xmi:XMI xmi:version="2.1" xmlns:uml="http://schema.omg.org/spec/UML/2.1" xmlns:xmi="http://schema.omg.org/spec/XMI/2.1"
         xmlns:ArchiMate3="http://www.sparxsystems.com/profiles/ArchiMate3/1.0">
  <xmi:Documentation exporter="Enterprise Architect" exporterVersion="6.5"/>
  <uml:Model xmi:type="uml:Model" name="Orders">
    <packagedElement xmi:type="uml:Package" xmi:id="EAPK_root" name="Domain">
      <packagedElement xmi:type="uml:Class" xmi:id="EAID_Order" name="Order">
        <ownedAttribute xmi:id="EAID_total" name="total"/>
        <ownedOperation xmi:id="EAID_submit" name="submit"/>
        <generalization xmi:type="uml:Generalization" xmi:id="EAID_Gen" general="EAID_Doc"/>
      </packagedElement>
      <packagedElement xmi:type="uml:Class" xmi:id="EAID_Doc" name="Document"/>
      <packagedElement xmi:type="uml:Class" xmi:id="EAID_Clerk" name="Clerk"/>
      <packagedElement xmi:type="uml:AssociationClass" xmi:id="EAID_Assign" name="Assignment">
        <memberEnd xmi:idref="EAID_src2"/><memberEnd xmi:idref="EAID_dst2"/>
        <ownedEnd xmi:type="uml:Property" xmi:id="EAID_src2"><type xmi:idref="EAID_Clerk"/></ownedEnd>
        <ownedEnd xmi:type="uml:Property" xmi:id="EAID_dst2"><type xmi:idref="EAID_Order"/></ownedEnd>
      </packagedElement>
      <packagedElement xmi:type="uml:Dependency" xmi:id="EAID_Dep" client="EAID_Clerk" supplier="EAID_Doc"/>
      <packagedElement xmi:type="uml:Dependency" xmi:id="EAID_Lost" client="EAID_Clerk" supplier="EAID_Nowhere"/>
    </packagedElement>
  </uml:Model>
  <ArchiMate3:ArchiMate_BusinessRole base_Class="EAID_Clerk"/>
  <xmi:Extension extender="Enterprise Architect" extenderID="6.5">
    <elements>
      <element xmi:idref="EAID_Doc" xmi:type="uml:Class" name="Document">
        <properties documentation="A &lt;b&gt;stored&lt;/b&gt; document" stereotype="ArchiMate_BusinessObject"/>
        <tags><tag name="owner" value="records"/></tags>
      </element>
    </elements>
    <connectors>
      <connector xmi:idref="EAID_Dep">
        <documentation value="reads"/>
        <properties ea_type="Dependency" direction="Source -&gt; Destination"/>
      </connector>
    </connectors>
    <diagrams>
      <diagram xmi:id="EAID_Diagram">
        <model package="EAPK_root"/>
        <properties name="Order domain" type="Logical"/>
        <elements>
          <element geometry="Left=100;Top=50;Right=190;Bottom=120;" subject="EAID_Clerk" seqno="1"/>
          <element geometry="Left=300;Top=50;Right=390;Bottom=120;" subject="EAID_Doc" seqno="2"/>
          <element geometry="SX=0;SY=0;EX=0;EY=0;Path=190:85$300:85$;" subject="EAID_Dep"/>
        </elements>
      </diagram>
    </diagrams>
  </xmi:Extension>
</xmi:XMI>
"##;
